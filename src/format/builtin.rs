//! Built-in formats: JSON, YAML and BSON.
//!
//! Entities encode as their field map. Collections encode as
//! `{"totalSize": <unpaged total>, "items": [...]}` so clients can page.

use bson::{Bson, Document};
use serde_json::{Map, Value};

use super::core::FormatDescriptor;
use crate::error::RestError;
use crate::result::{Collection, Entity};

/// Key carrying the unpaged total in encoded collections
pub const TOTAL_SIZE_FIELD: &str = "totalSize";
/// Key carrying the encoded page in collections
pub const ITEMS_FIELD: &str = "items";

#[must_use]
pub fn json() -> FormatDescriptor {
    FormatDescriptor::new("json")
        .extensions(&["json", "js"])
        .mime_types(&["application/json", "text/json", "application/javascript"])
        .entity_encoder(json_entity)
        .collection_encoder(json_collection)
        .decoder(json_decode)
}

#[must_use]
pub fn yaml() -> FormatDescriptor {
    FormatDescriptor::new("yaml")
        .extensions(&["yaml", "yml"])
        .mime_types(&["application/yaml", "application/x-yaml", "text/yaml"])
        .entity_encoder(yaml_entity)
        .collection_encoder(yaml_collection)
        .decoder(yaml_decode)
}

#[must_use]
pub fn bson() -> FormatDescriptor {
    FormatDescriptor::new("bson")
        .extensions(&["bson"])
        .mime_types(&["application/bson"])
        .entity_encoder(bson_entity)
        .collection_encoder(bson_collection)
        .decoder(bson_decode)
}

fn collection_value(collection: &Collection, total: u64) -> Value {
    let items: Vec<Value> = collection
        .items()
        .iter()
        .map(|e| Value::Object(e.fields().clone()))
        .collect();
    let mut wrapper = Map::new();
    wrapper.insert(TOTAL_SIZE_FIELD.to_string(), Value::from(total));
    wrapper.insert(ITEMS_FIELD.to_string(), Value::Array(items));
    Value::Object(wrapper)
}

fn json_entity(entity: &Entity) -> Result<Vec<u8>, RestError> {
    serde_json::to_vec(entity.fields()).map_err(|e| RestError::format("json", e))
}

fn json_collection(collection: &Collection, total: u64) -> Result<Vec<u8>, RestError> {
    serde_json::to_vec(&collection_value(collection, total)).map_err(|e| RestError::format("json", e))
}

fn json_decode(bytes: &[u8]) -> Result<Value, RestError> {
    serde_json::from_slice(bytes).map_err(|e| RestError::format("json", e))
}

fn yaml_entity(entity: &Entity) -> Result<Vec<u8>, RestError> {
    serde_yaml::to_string(entity.fields())
        .map(String::into_bytes)
        .map_err(|e| RestError::format("yaml", e))
}

fn yaml_collection(collection: &Collection, total: u64) -> Result<Vec<u8>, RestError> {
    serde_yaml::to_string(&collection_value(collection, total))
        .map(String::into_bytes)
        .map_err(|e| RestError::format("yaml", e))
}

fn yaml_decode(bytes: &[u8]) -> Result<Value, RestError> {
    serde_yaml::from_slice(bytes).map_err(|e| RestError::format("yaml", e))
}

/// Convert a plain structure into a BSON document.
///
/// Arrays become documents keyed `"0"`, `"1"`, ... since BSON has no top-level
/// array.
///
/// # Errors
///
/// Fails for scalars and for numbers BSON cannot represent.
pub fn bson_document(value: &Value) -> Result<Document, RestError> {
    match value {
        Value::Object(map) => bson::to_document(map).map_err(|e| RestError::format("bson", e)),
        Value::Array(items) => {
            let mut doc = Document::new();
            for (idx, item) in items.iter().enumerate() {
                let b = bson::to_bson(item).map_err(|e| RestError::format("bson", e))?;
                doc.insert(idx.to_string(), b);
            }
            Ok(doc)
        }
        other => Err(RestError::format(
            "bson",
            format!("top-level value must be a document, got {}", other),
        )),
    }
}

/// Serialize a document to bytes
///
/// # Errors
///
/// Fails if the document cannot be written.
pub fn bson_bytes(doc: &Document) -> Result<Vec<u8>, RestError> {
    let mut buf = Vec::new();
    doc.to_writer(&mut buf)
        .map_err(|e| RestError::format("bson", e))?;
    Ok(buf)
}

fn bson_entity(entity: &Entity) -> Result<Vec<u8>, RestError> {
    let doc = bson::to_document(entity.fields()).map_err(|e| RestError::format("bson", e))?;
    bson_bytes(&doc)
}

fn bson_collection(collection: &Collection, total: u64) -> Result<Vec<u8>, RestError> {
    bson_bytes(&bson_document(&collection_value(collection, total))?)
}

fn bson_decode(bytes: &[u8]) -> Result<Value, RestError> {
    let doc = Document::from_reader(bytes).map_err(|e| RestError::format("bson", e))?;
    Ok(Bson::Document(doc).into_relaxed_extjson())
}

/// Field map of a decoded body, or an error when the body is not a map
///
/// # Errors
///
/// Fails when `value` is not an object.
pub fn expect_object(format: &str, value: Value) -> Result<Map<String, Value>, RestError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RestError::format(
            format,
            format!("expected an object body, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article() -> Entity {
        let fields = json!({"ID": 5, "Title": "Change 1", "Subtitle": "Sub", "Rating": 4.5});
        Entity::new("Article", fields.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_entity_roundtrip_all_formats() {
        let entity = article();
        for desc in [json(), yaml(), bson()] {
            let bytes = desc.encode_entity(&entity).unwrap();
            let decoded = desc.decode(&bytes).unwrap();
            assert_eq!(
                decoded,
                Value::Object(entity.fields().clone()),
                "round trip failed for {}",
                desc.id()
            );
        }
    }

    #[test]
    fn test_collection_reports_total_not_page_size() {
        let all: Vec<Entity> = (1..=5)
            .map(|i| Entity::new("Article", json!({"ID": i}).as_object().cloned().unwrap_or_default()))
            .collect();
        let page = Collection::page(all, 0, Some(2));
        for desc in [json(), yaml(), bson()] {
            let decoded = desc.decode(&desc.encode_collection(&page).unwrap()).unwrap();
            assert_eq!(decoded[TOTAL_SIZE_FIELD], json!(5), "{}", desc.id());
            assert_eq!(decoded[ITEMS_FIELD].as_array().map(Vec::len), Some(2), "{}", desc.id());
        }
    }

    #[test]
    fn test_bson_array_becomes_indexed_document() {
        let doc = bson_document(&json!(["a", "b"])).unwrap();
        assert_eq!(doc.get_str("0").ok(), Some("a"));
        assert_eq!(doc.get_str("1").ok(), Some("b"));
        assert!(bson_document(&json!(3)).is_err());
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        match json().decode(b"{not json") {
            Err(RestError::Format { format, .. }) => assert_eq!(format, "json"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_expect_object() {
        assert!(expect_object("json", json!({"a": 1})).is_ok());
        assert!(expect_object("json", json!([1])).is_err());
    }
}
