use std::collections::HashMap;

use serde_json::json;

use super::{Authenticator, Principal};
use crate::server::RestRequest;

/// Treats every request as anonymous
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthenticator;

impl Authenticator for NoAuthenticator {
    fn authenticate(&self, _req: &RestRequest) -> Option<Principal> {
        None
    }
}

/// Static token authenticator.
///
/// Looks for a token in `x-api-key`, then in `Authorization: Bearer <token>`,
/// and maps it to a principal id.
#[derive(Debug, Clone, Default)]
pub struct HeaderTokenAuthenticator {
    tokens: HashMap<String, String>,
    header_name: String,
}

impl HeaderTokenAuthenticator {
    /// `tokens` maps token → principal id
    #[must_use]
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self {
            tokens,
            header_name: "x-api-key".to_string(),
        }
    }

    /// Configure the header checked before `Authorization`
    ///
    /// Default: `x-api-key`
    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into().to_ascii_lowercase();
        self
    }

    fn extract_token<'a>(&self, req: &'a RestRequest) -> Option<&'a str> {
        req.get_header(&self.header_name).or_else(|| {
            req.get_header("authorization")
                .and_then(|h| h.strip_prefix("Bearer "))
        })
    }
}

impl Authenticator for HeaderTokenAuthenticator {
    fn authenticate(&self, req: &RestRequest) -> Option<Principal> {
        let token = self.extract_token(req)?.trim();
        self.tokens
            .get(token)
            .map(|id| Principal::new(id.clone()).with_claims(json!({ "auth": "header-token" })))
    }
}
