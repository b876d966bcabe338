//! Callback URLs handed to workers.

/// What the scheduler knows about the request that triggered a scale-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub scheme: String,
    pub host: String,
}

impl RequestContext {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }
}

pub trait PublicAddress: Send + Sync {
    fn public_address_path(&self, path: &str, request: &RequestContext, token: &str) -> String;
}

/// Uses the configured public address when there is one, otherwise the
/// address the request came in on.
#[derive(Debug, Clone, Default)]
pub struct PublicAddressResolver {
    public_address: Option<String>,
}

impl PublicAddressResolver {
    pub fn new(public_address: Option<String>) -> Self {
        Self {
            public_address: public_address.map(|address| address.trim_end_matches('/').to_string()),
        }
    }
}

impl PublicAddress for PublicAddressResolver {
    fn public_address_path(&self, path: &str, request: &RequestContext, token: &str) -> String {
        let address = match &self.public_address {
            Some(address) => address.clone(),
            None => format!("{}://{}", request.scheme, request.host),
        };
        if token.is_empty() {
            format!("{address}{path}")
        } else {
            format!("{address}{path}?token={token}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_request_address() {
        let resolver = PublicAddressResolver::default();
        let request = RequestContext::new("http", "10.0.0.2:3000");
        assert_eq!(
            resolver.public_address_path("/commit", &request, "abc"),
            "http://10.0.0.2:3000/commit?token=abc"
        );
    }

    #[test]
    fn test_configured_address_wins() {
        let resolver = PublicAddressResolver::new(Some("https://odm.example.com/".to_string()));
        let request = RequestContext::new("http", "internal:3000");
        assert_eq!(
            resolver.public_address_path("/commit", &request, "abc"),
            "https://odm.example.com/commit?token=abc"
        );
    }

    #[test]
    fn test_empty_token_has_no_query() {
        let resolver = PublicAddressResolver::default();
        let request = RequestContext::new("https", "odm.example.com");
        assert_eq!(
            resolver.public_address_path("/commit", &request, ""),
            "https://odm.example.com/commit"
        );
    }
}
