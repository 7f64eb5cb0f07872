//! SDK configuration
//!
//! Built once by the caller, then shared read-only across the client.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default streaming endpoint
pub const DEFAULT_STREAM_URI: &str = "https://stream.flagstream.io/";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Immutable SDK configuration
#[derive(Debug, Clone)]
pub struct Config {
    sdk_key: String,
    stream_uri: Url,
    connect_timeout: Duration,
    read_timeout: Duration,
    wrapper_name: Option<String>,
    wrapper_version: Option<String>,
    all_attributes_private: bool,
    private_attribute_names: Vec<String>,
    use_report: bool,
}

impl Config {
    pub fn builder(sdk_key: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(sdk_key)
    }

    pub fn sdk_key(&self) -> &str {
        &self.sdk_key
    }

    pub fn stream_uri(&self) -> &Url {
        &self.stream_uri
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Maximum silence between stream chunks before the connection is
    /// considered dead
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn wrapper_name(&self) -> Option<&str> {
        self.wrapper_name.as_deref()
    }

    pub fn wrapper_version(&self) -> Option<&str> {
        self.wrapper_version.as_deref()
    }

    pub fn all_attributes_private(&self) -> bool {
        self.all_attributes_private
    }

    pub fn private_attribute_names(&self) -> &[String] {
        &self.private_attribute_names
    }

    /// Stream with REPORT and a request body instead of GET
    pub fn use_report(&self) -> bool {
        self.use_report
    }
}

/// Builder for [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    sdk_key: String,
    stream_uri: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    wrapper_name: Option<String>,
    wrapper_version: Option<String>,
    all_attributes_private: bool,
    private_attribute_names: Vec<String>,
    use_report: bool,
}

impl ConfigBuilder {
    pub fn new(sdk_key: impl Into<String>) -> Self {
        Self {
            sdk_key: sdk_key.into(),
            stream_uri: DEFAULT_STREAM_URI.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            wrapper_name: None,
            wrapper_version: None,
            all_attributes_private: false,
            private_attribute_names: Vec::new(),
            use_report: false,
        }
    }

    pub fn stream_uri(mut self, uri: impl Into<String>) -> Self {
        self.stream_uri = uri.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Identify a wrapper library in request headers
    pub fn wrapper(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.wrapper_name = Some(name.into());
        self.wrapper_version = version;
        self
    }

    /// Redact every user attribute except the key in event payloads
    pub fn all_attributes_private(mut self, private: bool) -> Self {
        self.all_attributes_private = private;
        self
    }

    /// Redact the named attribute in event payloads for every user
    pub fn private_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.private_attribute_names.push(name.into());
        self
    }

    pub fn use_report(mut self, use_report: bool) -> Self {
        self.use_report = use_report;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if self.sdk_key.is_empty() {
            return Err(ConfigError::MissingSdkKey);
        }
        if !header_safe(&self.sdk_key) {
            return Err(ConfigError::InvalidHeaderValue { field: "sdk key" });
        }
        for (field, value) in [
            ("wrapper name", self.wrapper_name.as_deref()),
            ("wrapper version", self.wrapper_version.as_deref()),
        ] {
            if let Some(value) = value {
                if !header_safe(value) {
                    return Err(ConfigError::InvalidHeaderValue { field });
                }
            }
        }
        let stream_uri = Url::parse(&self.stream_uri)?;

        Ok(Config {
            sdk_key: self.sdk_key,
            stream_uri,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            wrapper_name: self.wrapper_name,
            wrapper_version: self.wrapper_version,
            all_attributes_private: self.all_attributes_private,
            private_attribute_names: self.private_attribute_names,
            use_report: self.use_report,
        })
    }
}

/// Visible ASCII only, so the value is always a legal header value
fn header_safe(value: &str) -> bool {
    value.bytes().all(|b| (0x20..0x7f).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::builder("sdk-key-123").build().unwrap();
        assert_eq!(config.sdk_key(), "sdk-key-123");
        assert_eq!(config.stream_uri().as_str(), DEFAULT_STREAM_URI);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.read_timeout(), Duration::from_secs(300));
        assert!(config.wrapper_name().is_none());
        assert!(!config.all_attributes_private());
        assert!(!config.use_report());
    }

    #[test]
    fn test_empty_sdk_key_rejected() {
        let err = Config::builder("").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingSdkKey);
    }

    #[test]
    fn test_non_ascii_sdk_key_rejected() {
        let err = Config::builder("clé-secrète").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeaderValue { .. }));
    }

    #[test]
    fn test_invalid_stream_uri_rejected() {
        let err = Config::builder("key")
            .stream_uri("not a uri")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUri(_)));
    }

    #[test]
    fn test_wrapper_and_privacy_settings() {
        let config = Config::builder("key")
            .wrapper("middleware", Some("2.1.0".to_string()))
            .all_attributes_private(true)
            .private_attribute_name("email")
            .build()
            .unwrap();
        assert_eq!(config.wrapper_name(), Some("middleware"));
        assert_eq!(config.wrapper_version(), Some("2.1.0"));
        assert!(config.all_attributes_private());
        assert_eq!(config.private_attribute_names(), ["email".to_string()]);
    }
}
