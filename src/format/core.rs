use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::builtin;
use crate::error::RestError;
use crate::result::{Collection, Entity};

/// Encodes one entity
pub type EntityEncoder = fn(&Entity) -> Result<Vec<u8>, RestError>;
/// Encodes a page of entities; the second argument is the unpaged total
pub type CollectionEncoder = fn(&Collection, u64) -> Result<Vec<u8>, RestError>;
/// Decodes a request body into a plain structure
pub type Decoder = fn(&[u8]) -> Result<Value, RestError>;

/// A registered serialization scheme.
///
/// The first MIME type is the one advertised in the response `Content-Type`.
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    id: String,
    extensions: Vec<String>,
    mime_types: Vec<String>,
    encode_entity: EntityEncoder,
    encode_collection: CollectionEncoder,
    decode: Decoder,
}

impl FormatDescriptor {
    /// Start a descriptor with no extensions, no MIME types and codecs that
    /// reject everything. Fill it in with the builder methods.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_ascii_lowercase(),
            extensions: Vec::new(),
            mime_types: Vec::new(),
            encode_entity: unsupported_entity,
            encode_collection: unsupported_collection,
            decode: unsupported_decode,
        }
    }

    #[must_use]
    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    #[must_use]
    pub fn mime_types(mut self, mime_types: &[&str]) -> Self {
        self.mime_types = mime_types.iter().map(|m| m.to_ascii_lowercase()).collect();
        self
    }

    #[must_use]
    pub fn entity_encoder(mut self, f: EntityEncoder) -> Self {
        self.encode_entity = f;
        self
    }

    #[must_use]
    pub fn collection_encoder(mut self, f: CollectionEncoder) -> Self {
        self.encode_collection = f;
        self
    }

    #[must_use]
    pub fn decoder(mut self, f: Decoder) -> Self {
        self.decode = f;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn extension_list(&self) -> &[String] {
        &self.extensions
    }

    #[must_use]
    pub fn mime_type_list(&self) -> &[String] {
        &self.mime_types
    }

    /// MIME type to advertise for encoded output
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.mime_types
            .first()
            .map(String::as_str)
            .unwrap_or("application/octet-stream")
    }

    #[must_use]
    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    #[must_use]
    pub fn handles_mime_type(&self, mime: &str) -> bool {
        self.mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime))
    }

    /// # Errors
    ///
    /// Propagates the encoder's failure.
    pub fn encode_entity(&self, entity: &Entity) -> Result<Vec<u8>, RestError> {
        (self.encode_entity)(entity)
    }

    /// Encode a collection, reporting its unpaged total.
    ///
    /// # Errors
    ///
    /// Propagates the encoder's failure.
    pub fn encode_collection(&self, collection: &Collection) -> Result<Vec<u8>, RestError> {
        (self.encode_collection)(collection, collection.total())
    }

    /// # Errors
    ///
    /// Fails when the bytes are not valid for this format.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, RestError> {
        (self.decode)(bytes)
    }
}

fn unsupported_entity(_: &Entity) -> Result<Vec<u8>, RestError> {
    Err(RestError::format("unknown", "entity encoding not supported"))
}

fn unsupported_collection(_: &Collection, _: u64) -> Result<Vec<u8>, RestError> {
    Err(RestError::format("unknown", "collection encoding not supported"))
}

fn unsupported_decode(_: &[u8]) -> Result<Value, RestError> {
    Err(RestError::format("unknown", "decoding not supported"))
}

/// Set of formats available for negotiation.
///
/// Built at startup, then shared read-only (usually behind an `Arc`). Lookup order
/// is registration order.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<Arc<FormatDescriptor>>,
}

impl FormatRegistry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `json`, `yaml` and `bson` formats
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(builtin::json());
        registry.register(builtin::yaml());
        registry.register(builtin::bson());
        registry
    }

    /// Add a format. A format with the same id is replaced in place.
    pub fn register(&mut self, descriptor: FormatDescriptor) {
        let descriptor = Arc::new(descriptor);
        if let Some(slot) = self.formats.iter_mut().find(|f| f.id == descriptor.id) {
            warn!(format = %descriptor.id, "Replaced existing format registration");
            *slot = descriptor;
            return;
        }
        info!(
            format = %descriptor.id,
            extensions = ?descriptor.extensions,
            mime_types = ?descriptor.mime_types,
            total_formats = self.formats.len() + 1,
            "Format registered"
        );
        self.formats.push(descriptor);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<FormatDescriptor>> {
        self.formats
            .iter()
            .find(|f| f.id.eq_ignore_ascii_case(id))
            .cloned()
    }

    #[must_use]
    pub fn for_extension(&self, ext: &str) -> Option<Arc<FormatDescriptor>> {
        let ext = ext.trim_start_matches('.');
        self.formats
            .iter()
            .find(|f| f.handles_extension(ext))
            .cloned()
    }

    #[must_use]
    pub fn for_mime_type(&self, mime: &str) -> Option<Arc<FormatDescriptor>> {
        let mime = mime.trim();
        self.formats
            .iter()
            .find(|f| f.handles_mime_type(mime))
            .cloned()
    }

    /// First format matching any of `mimes`, honoring their order
    #[must_use]
    pub fn for_mime_types<S: AsRef<str>>(&self, mimes: &[S]) -> Option<Arc<FormatDescriptor>> {
        mimes.iter().find_map(|m| self.for_mime_type(m.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FormatDescriptor>> {
        self.formats.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
