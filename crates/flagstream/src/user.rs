//! User context model
//!
//! Describes who flags are being evaluated for. Serializes to the JSON shape
//! the service expects; attribute redaction for event payloads lives in
//! [`crate::events`].

use serde::Serialize;
use serde_json::{Map, Value};

/// A user (or other evaluation context) known to the service by its key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    anonymous: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    custom: Map<String, Value>,
    // Redaction input, never sent on the wire
    #[serde(skip)]
    private_attribute_names: Vec<String>,
}

impl User {
    /// A user with only a key
    pub fn with_key(key: impl Into<String>) -> Self {
        UserBuilder::new(key).build()
    }

    pub fn builder(key: impl Into<String>) -> UserBuilder {
        UserBuilder::new(key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn custom(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Attributes this user asked to keep out of event payloads
    pub fn private_attribute_names(&self) -> &[String] {
        &self.private_attribute_names
    }
}

/// Builder for [`User`]
#[derive(Debug, Clone)]
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            user: User {
                key: key.into(),
                secondary: None,
                ip: None,
                country: None,
                email: None,
                name: None,
                avatar: None,
                first_name: None,
                last_name: None,
                anonymous: false,
                custom: Map::new(),
                private_attribute_names: Vec::new(),
            },
        }
    }

    pub fn secondary(mut self, secondary: impl Into<String>) -> Self {
        self.user.secondary = Some(secondary.into());
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.user.ip = Some(ip.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.user.country = Some(country.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.user.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.user.name = Some(name.into());
        self
    }

    pub fn avatar(mut self, avatar: impl Into<String>) -> Self {
        self.user.avatar = Some(avatar.into());
        self
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.user.first_name = Some(first_name.into());
        self
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.user.last_name = Some(last_name.into());
        self
    }

    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.user.anonymous = anonymous;
        self
    }

    /// Attach an arbitrary custom attribute
    pub fn custom(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user.custom.insert(name.into(), value.into());
        self
    }

    /// Mark an attribute (built-in or custom) as private for this user
    pub fn private_attribute(mut self, name: impl Into<String>) -> Self {
        self.user.private_attribute_names.push(name.into());
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_user_serializes_to_key_only() {
        let user = User::with_key("user-1");
        assert_eq!(serde_json::to_value(&user).unwrap(), json!({"key": "user-1"}));
    }

    #[test]
    fn test_full_user_serialization() {
        let user = User::builder("user-2")
            .email("u@example.com")
            .first_name("Sam")
            .anonymous(true)
            .custom("plan", "pro")
            .custom("seats", 5)
            .build();
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            json!({
                "key": "user-2",
                "email": "u@example.com",
                "firstName": "Sam",
                "anonymous": true,
                "custom": {"plan": "pro", "seats": 5}
            })
        );
    }

    #[test]
    fn test_private_attribute_names_not_serialized() {
        let user = User::builder("user-3")
            .email("u@example.com")
            .private_attribute("email")
            .build();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("privateAttributeNames").is_none());
        assert_eq!(user.private_attribute_names(), ["email".to_string()]);
    }
}
