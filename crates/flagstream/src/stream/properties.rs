//! Description of a streaming connection to open

use reqwest::Method;
use url::Url;

/// What to connect to: endpoint, HTTP method, and an optional request body.
/// Built once by the caller and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProperties {
    uri: Url,
    method: Method,
    body: Option<Vec<u8>>,
}

impl StreamProperties {
    pub fn new(uri: Url, method: Method, body: Option<Vec<u8>>) -> Self {
        Self { uri, method, body }
    }

    /// A plain GET stream with no body
    pub fn get(uri: Url) -> Self {
        Self::new(uri, Method::GET, None)
    }

    /// A REPORT stream carrying the user JSON in the request body
    pub fn report(uri: Url, body: Vec<u8>) -> Self {
        // "REPORT" is a valid method token, from_bytes cannot fail on it
        let method = Method::from_bytes(b"REPORT").unwrap_or(Method::GET);
        Self::new(uri, method, Some(body))
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_properties() {
        let uri = Url::parse("https://stream.example.com/all").unwrap();
        let props = StreamProperties::get(uri.clone());
        assert_eq!(props.uri(), &uri);
        assert_eq!(props.method(), &Method::GET);
        assert!(props.body().is_none());
    }

    #[test]
    fn test_report_properties() {
        let uri = Url::parse("https://stream.example.com/eval").unwrap();
        let props = StreamProperties::report(uri, b"{\"key\":\"u\"}".to_vec());
        assert_eq!(props.method().as_str(), "REPORT");
        assert_eq!(props.body(), Some(&b"{\"key\":\"u\"}"[..]));
    }

    #[test]
    fn test_value_equality() {
        let uri = Url::parse("https://stream.example.com/all").unwrap();
        assert_eq!(
            StreamProperties::get(uri.clone()),
            StreamProperties::get(uri)
        );
    }
}
