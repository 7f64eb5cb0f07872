//! Private-attribute redaction for user payloads in events
//!
//! Private attributes come from three places: the global config list, the
//! per-user list, and the all-attributes-private switch. The user key and
//! the anonymous marker are never redacted; the service needs both.

use serde_json::Value;

use crate::config::Config;
use crate::user::User;

/// Attributes that survive redaction unconditionally
const ALWAYS_KEPT: [&str; 2] = ["key", "anonymous"];

/// Serialize `user` for an event payload, stripping private attributes and
/// listing their names under `privateAttrs`.
pub fn scrub_user(user: &User, config: &Config) -> Value {
    let mut value = serde_json::to_value(user).unwrap_or_default();
    let Some(object) = value.as_object_mut() else {
        return value;
    };

    let is_private = |name: &str| {
        config.all_attributes_private()
            || config.private_attribute_names().iter().any(|n| n == name)
            || user.private_attribute_names().iter().any(|n| n == name)
    };

    let mut redacted: Vec<String> = Vec::new();

    let built_ins: Vec<String> = object
        .keys()
        .filter(|name| !ALWAYS_KEPT.contains(&name.as_str()) && *name != "custom")
        .cloned()
        .collect();
    for name in built_ins {
        if is_private(&name) {
            object.remove(&name);
            redacted.push(name);
        }
    }

    if let Some(custom) = object.get_mut("custom").and_then(Value::as_object_mut) {
        let names: Vec<String> = custom.keys().cloned().collect();
        for name in names {
            if is_private(&name) {
                custom.remove(&name);
                redacted.push(name);
            }
        }
        if custom.is_empty() {
            object.remove("custom");
        }
    }

    if !redacted.is_empty() {
        redacted.sort();
        object.insert(
            "privateAttrs".to_string(),
            Value::from(redacted),
        );
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User::builder("user-1")
            .email("u@example.com")
            .name("Sam")
            .custom("plan", "pro")
            .custom("region", "eu-west")
            .build()
    }

    #[test]
    fn test_no_private_attributes_is_passthrough() {
        let config = Config::builder("key").build().unwrap();
        let value = scrub_user(&sample_user(), &config);
        assert_eq!(value["email"], "u@example.com");
        assert_eq!(value["custom"]["plan"], "pro");
        assert!(value.get("privateAttrs").is_none());
    }

    #[test]
    fn test_global_private_attribute_redacted() {
        let config = Config::builder("key")
            .private_attribute_name("email")
            .build()
            .unwrap();
        let value = scrub_user(&sample_user(), &config);
        assert!(value.get("email").is_none());
        assert_eq!(value["privateAttrs"], json!(["email"]));
    }

    #[test]
    fn test_per_user_private_attribute_redacted() {
        let config = Config::builder("key").build().unwrap();
        let user = User::builder("user-1")
            .email("u@example.com")
            .custom("plan", "pro")
            .private_attribute("plan")
            .build();
        let value = scrub_user(&user, &config);
        assert_eq!(value["email"], "u@example.com");
        assert!(value.get("custom").is_none());
        assert_eq!(value["privateAttrs"], json!(["plan"]));
    }

    #[test]
    fn test_all_attributes_private_keeps_key_and_anonymous() {
        let config = Config::builder("key")
            .all_attributes_private(true)
            .build()
            .unwrap();
        let user = User::builder("user-1")
            .email("u@example.com")
            .name("Sam")
            .anonymous(true)
            .custom("plan", "pro")
            .build();
        let value = scrub_user(&user, &config);
        assert_eq!(value["key"], "user-1");
        assert_eq!(value["anonymous"], true);
        assert!(value.get("email").is_none());
        assert!(value.get("name").is_none());
        assert!(value.get("custom").is_none());
        assert_eq!(value["privateAttrs"], json!(["email", "name", "plan"]));
    }

    #[test]
    fn test_key_never_redacted_even_if_listed() {
        let config = Config::builder("key")
            .private_attribute_name("key")
            .build()
            .unwrap();
        let value = scrub_user(&sample_user(), &config);
        assert_eq!(value["key"], "user-1");
    }
}
