use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::builtin::{bson_bytes, bson_document};
use super::core::{FormatDescriptor, FormatRegistry};
use crate::config::RestConfig;
use crate::error::RestError;
use crate::result::RawResult;
use crate::server::request::{parse_accept, RestRequest};

/// Which direction a format is being selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Decoding an incoming payload; the `Accept` header is ignored
    RequestBody,
    /// Encoding the outgoing payload; the `Accept` header is considered
    Response,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::RequestBody => write!(f, "request body"),
            SelectionMode::Response => write!(f, "response"),
        }
    }
}

/// Output of [`ResponseFormatter::format`]
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedBody {
    /// Bytes produced by a format, with that format's MIME type
    Encoded {
        content_type: String,
        bytes: Vec<u8>,
    },
    /// The raw result, left for the serving runtime to render
    Passthrough(RawResult),
}

/// Content negotiation and response encoding.
///
/// Selection precedence is fixed: path extension, then `Accept` (response mode
/// only), then `Content-Type`, then the configured default extension.
#[derive(Debug, Clone)]
pub struct ResponseFormatter {
    formats: Arc<FormatRegistry>,
    default_extension: String,
}

impl ResponseFormatter {
    #[must_use]
    pub fn new(formats: Arc<FormatRegistry>, config: &RestConfig) -> Self {
        Self {
            formats,
            default_extension: config.default_extension.clone(),
        }
    }

    #[must_use]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    #[must_use]
    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    /// Select the format for `req` in the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::NoFormatter`] when nothing matches.
    pub fn select(
        &self,
        req: &RestRequest,
        mode: SelectionMode,
    ) -> Result<Arc<FormatDescriptor>, RestError> {
        let no_formatter = |hint: &str| RestError::NoFormatter {
            mode,
            hint: hint.to_string(),
        };

        if !req.extension.is_empty() {
            let found = self.formats.for_extension(&req.extension);
            debug!(
                request_id = %req.request_id,
                mode = %mode,
                extension = %req.extension,
                format = ?found.as_ref().map(|f| f.id().to_string()),
                "Format resolved by extension"
            );
            return found.ok_or_else(|| no_formatter(&format!("extension '{}'", req.extension)));
        }

        if mode == SelectionMode::Response {
            if let Some(accept) = req.accept().filter(|a| *a != "*/*") {
                let mime_types = parse_accept(accept);
                let found = self
                    .formats
                    .for_mime_types(&mime_types)
                    .or_else(|| self.formats.for_extension(&self.default_extension));
                debug!(
                    request_id = %req.request_id,
                    accept = %accept,
                    format = ?found.as_ref().map(|f| f.id().to_string()),
                    "Format resolved by Accept header"
                );
                return found.ok_or_else(|| no_formatter(&format!("Accept '{}'", accept)));
            }
        }

        if let Some(content_type) = req.content_type() {
            let found = self.formats.for_mime_type(content_type);
            debug!(
                request_id = %req.request_id,
                mode = %mode,
                content_type = %content_type,
                format = ?found.as_ref().map(|f| f.id().to_string()),
                "Format resolved by Content-Type"
            );
            return found.ok_or_else(|| no_formatter(&format!("Content-Type '{}'", content_type)));
        }

        self.formats
            .for_extension(&self.default_extension)
            .ok_or_else(|| no_formatter(&format!("default extension '{}'", self.default_extension)))
    }

    /// Format used to decode the request body
    ///
    /// # Errors
    ///
    /// Returns [`RestError::NoFormatter`] when nothing matches.
    pub fn request_format(&self, req: &RestRequest) -> Result<Arc<FormatDescriptor>, RestError> {
        self.select(req, SelectionMode::RequestBody)
    }

    /// Format used to encode the response
    ///
    /// # Errors
    ///
    /// Returns [`RestError::NoFormatter`] when nothing matches.
    pub fn response_format(&self, req: &RestRequest) -> Result<Arc<FormatDescriptor>, RestError> {
        self.select(req, SelectionMode::Response)
    }

    /// Decode `body` with the request-mode format of `req`.
    ///
    /// An empty body decodes to `Null`.
    ///
    /// # Errors
    ///
    /// Fails when no format matches or the body is malformed.
    pub fn decode_body(&self, req: &RestRequest, body: &[u8]) -> Result<Value, RestError> {
        if body.is_empty() {
            return Ok(Value::Null);
        }
        self.request_format(req)?.decode(body)
    }

    /// Convert a handler result into a response body.
    ///
    /// When no format can be selected the raw value is passed through rather
    /// than failing the request.
    ///
    /// # Errors
    ///
    /// Fails only when the selected format's encoder fails.
    pub fn format(&self, req: &RestRequest, result: RawResult) -> Result<FormattedBody, RestError> {
        let format = match self.response_format(req) {
            Ok(format) => format,
            Err(err) => {
                warn!(
                    request_id = %req.request_id,
                    result_kind = result.kind(),
                    error = %err,
                    "No formatter for response - passing raw value through"
                );
                return Ok(FormattedBody::Passthrough(result));
            }
        };

        let encoded = |bytes: Vec<u8>| FormattedBody::Encoded {
            content_type: format.content_type().to_string(),
            bytes,
        };

        match result {
            RawResult::SingleEntity(entity) => Ok(encoded(format.encode_entity(&entity)?)),
            RawResult::Collection(collection) => {
                debug!(
                    request_id = %req.request_id,
                    page_size = collection.len(),
                    total = collection.total(),
                    format = %format.id(),
                    "Encoding collection"
                );
                Ok(encoded(format.encode_collection(&collection)?))
            }
            RawResult::PlainStructure(value) => {
                let content_type = format.content_type();
                if content_type.ends_with("/json") {
                    let bytes =
                        serde_json::to_vec(&value).map_err(|e| RestError::format("json", e))?;
                    Ok(encoded(bytes))
                } else if content_type.ends_with("/bson") {
                    Ok(encoded(bson_bytes(&bson_document(&value)?)?))
                } else {
                    debug!(
                        request_id = %req.request_id,
                        format = %format.id(),
                        "No generic encoding for plain structure - passing through"
                    );
                    Ok(FormattedBody::Passthrough(RawResult::PlainStructure(value)))
                }
            }
            RawResult::Opaque(value) => Ok(FormattedBody::Passthrough(RawResult::Opaque(value))),
        }
    }
}
