use std::sync::Arc;

use http::{HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};
use tracing::warn;

use super::request::HeaderVec;
use crate::error::RestError;
use crate::format::FormattedBody;
use crate::result::RawResult;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Fully rendered response, ready for the serving runtime to write out.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: StatusCode,
    /// Lowercase header names
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl RestResponse {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// `403` with no body, the answer to an unsupported verb
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// `200` carrying a formatter result.
    ///
    /// Passthrough values are rendered as text: the empty result becomes an
    /// empty body, strings are written verbatim and anything else as JSON text.
    #[must_use]
    pub fn from_formatted(body: FormattedBody) -> Self {
        match body {
            FormattedBody::Encoded {
                content_type,
                bytes,
            } => Self::new(StatusCode::OK)
                .with_header("content-type", content_type)
                .with_body(bytes),
            FormattedBody::Passthrough(raw) => Self::passthrough(raw),
        }
    }

    fn passthrough(raw: RawResult) -> Self {
        let value = match raw {
            RawResult::Opaque(Value::Null) => return Self::new(StatusCode::OK),
            RawResult::Opaque(Value::String(s)) => {
                return Self::new(StatusCode::OK)
                    .with_header("content-type", TEXT_PLAIN)
                    .with_body(s);
            }
            RawResult::Opaque(v) | RawResult::PlainStructure(v) => v,
            RawResult::SingleEntity(entity) => Value::Object(entity.fields().clone()),
            RawResult::Collection(collection) => Value::Array(
                collection
                    .items()
                    .iter()
                    .map(|e| Value::Object(e.fields().clone()))
                    .collect(),
            ),
        };
        Self::new(StatusCode::OK)
            .with_header("content-type", TEXT_PLAIN)
            .with_body(value.to_string())
    }

    /// Status from [`RestError::status`] with a small JSON body.
    ///
    /// Unsupported verbs keep their empty body.
    #[must_use]
    pub fn from_error(err: &RestError) -> Self {
        if matches!(err, RestError::UnsupportedMethod { .. }) {
            return Self::forbidden();
        }
        let status = err.status();
        let body = json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": err.to_string(),
        });
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        self.headers.retain(|(k, _)| k.as_ref() != name);
        self.headers.push((Arc::from(name.as_str()), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Convert into an [`http::Response`]. Headers that are not valid HTTP are
    /// dropped with a warning.
    #[must_use]
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut res = http::Response::new(self.body);
        *res.status_mut() = self.status;
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().insert(name, value);
                }
                _ => warn!(header = %name, "Dropping invalid response header"),
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{Collection, Entity};
    use serde_json::Map;

    #[test]
    fn test_forbidden_is_empty() {
        let res = RestResponse::forbidden();
        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert!(res.body.is_empty());
        assert!(res.content_type().is_none());
    }

    #[test]
    fn test_encoded_body() {
        let res = RestResponse::from_formatted(FormattedBody::Encoded {
            content_type: "application/json".to_string(),
            bytes: b"{}".to_vec(),
        });
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.body, b"{}");
    }

    #[test]
    fn test_passthrough_rendering() {
        let empty = RestResponse::from_formatted(FormattedBody::Passthrough(RawResult::null()));
        assert!(empty.body.is_empty());
        assert!(empty.content_type().is_none());

        let text = RestResponse::from_formatted(FormattedBody::Passthrough("hi".to_string().into()));
        assert_eq!(text.body, b"hi");
        assert_eq!(text.content_type(), Some(TEXT_PLAIN));

        let mut fields = Map::new();
        fields.insert("ID".into(), 1.into());
        let list = Collection::new(vec![Entity::new("Article", fields)]);
        let res = RestResponse::from_formatted(FormattedBody::Passthrough(list.into()));
        assert_eq!(res.body, br#"[{"ID":1}]"#);
    }

    #[test]
    fn test_error_body() {
        let res = RestResponse::from_error(&RestError::configuration("bad"));
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(body["error"], "Internal Server Error");

        let res = RestResponse::from_error(&RestError::UnsupportedMethod {
            method: http::Method::PATCH,
        });
        assert_eq!(res, RestResponse::forbidden());
    }

    #[test]
    fn test_into_http() {
        let res = RestResponse::new(StatusCode::OK)
            .with_header("Content-Type", "application/yaml")
            .with_body("a: 1\n")
            .into_http();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/yaml");
        assert_eq!(res.body(), b"a: 1\n");
    }
}
