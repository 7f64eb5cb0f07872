//! Request headers for the streaming endpoint

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use tracing::warn;

use crate::config::Config;

/// Wrapper identification header, an external contract with the service
const WRAPPER_HEADER: HeaderName = HeaderName::from_static("x-flagstream-wrapper");

/// Name and version reported in the User-Agent header
#[derive(Debug, Clone)]
pub struct SdkInfo {
    pub agent: &'static str,
    pub version: &'static str,
}

impl SdkInfo {
    pub fn current() -> Self {
        Self {
            agent: "FlagstreamClient",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Build the headers for one connection attempt. Pure: same inputs, same
/// headers. Config validation guarantees the values are legal, so the
/// fallible conversions below only guard against future config changes.
pub fn build_headers(config: &Config, sdk: &SdkInfo) -> HeaderMap {
    let mut headers = HeaderMap::new();

    insert(&mut headers, AUTHORIZATION, config.sdk_key());
    insert(
        &mut headers,
        USER_AGENT,
        &format!("{}/{}", sdk.agent, sdk.version),
    );
    insert(&mut headers, ACCEPT, "text/event-stream");

    if let Some(name) = config.wrapper_name() {
        let value = match config.wrapper_version() {
            Some(version) => format!("{name}/{version}"),
            None => name.to_string(),
        };
        insert(&mut headers, WRAPPER_HEADER, &value);
    }

    headers
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(err) => warn!("dropping invalid header {name}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_headers_present() {
        let config = Config::builder("abc").build().unwrap();
        let headers = build_headers(&config, &SdkInfo::current());
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "abc");
        assert_eq!(headers.get(ACCEPT).unwrap(), "text/event-stream");
        let agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(agent.starts_with("FlagstreamClient/"));
    }

    #[test]
    fn test_no_wrapper_header_by_default() {
        let config = Config::builder("abc").build().unwrap();
        let headers = build_headers(&config, &SdkInfo::current());
        assert!(headers.get(WRAPPER_HEADER).is_none());
    }

    #[test]
    fn test_wrapper_header_with_version() {
        let config = Config::builder("abc")
            .wrapper("middleware", Some("2.1.0".to_string()))
            .build()
            .unwrap();
        let headers = build_headers(&config, &SdkInfo::current());
        assert_eq!(headers.get(WRAPPER_HEADER).unwrap(), "middleware/2.1.0");
    }

    #[test]
    fn test_wrapper_header_without_version() {
        let config = Config::builder("abc")
            .wrapper("middleware", None)
            .build()
            .unwrap();
        let headers = build_headers(&config, &SdkInfo::current());
        assert_eq!(headers.get(WRAPPER_HEADER).unwrap(), "middleware");
    }
}
