//! Handler output model.
//!
//! Every controller handler returns a [`RawResult`]. The
//! [`ResponseFormatter`](crate::format::ResponseFormatter) matches on it
//! exhaustively to pick the right encoder.

use serde::Serialize;
use serde_json::{Map, Value};

/// Field holding an entity's identifier
pub const ID_FIELD: &str = "ID";

/// A single persisted record, as seen by the formatter.
///
/// The field map is what gets encoded; it includes the `ID` field when the
/// record has been assigned one.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    type_name: String,
    fields: Map<String, Value>,
}

impl Entity {
    pub fn new(type_name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Build an entity from any serializable record.
    ///
    /// # Errors
    ///
    /// Fails when `record` does not serialize to a JSON object.
    pub fn from_serializable<T: Serialize>(
        type_name: impl Into<String>,
        record: &T,
    ) -> anyhow::Result<Self> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self::new(type_name, fields)),
            other => anyhow::bail!("entity must serialize to an object, got {}", other),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Numeric identifier, if the record has one
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.fields.get(ID_FIELD).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copy every key of `data` onto this entity, except `ID`.
    pub fn update(&mut self, data: &Map<String, Value>) {
        for (key, value) in data {
            if key != ID_FIELD {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn set_id(&mut self, id: i64) {
        self.fields.insert(ID_FIELD.to_string(), Value::from(id));
    }
}

/// A materialized page of entities plus the size of the unpaged set.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    items: Vec<Entity>,
    total: u64,
}

impl Collection {
    /// A collection whose total is the number of items
    #[must_use]
    pub fn new(items: Vec<Entity>) -> Self {
        let total = items.len() as u64;
        Self { items, total }
    }

    /// A collection that is one page of a larger set of `total` entities
    #[must_use]
    pub fn with_total(items: Vec<Entity>, total: u64) -> Self {
        Self { items, total }
    }

    /// Page through `all`, keeping the pre-limit count as the total.
    #[must_use]
    pub fn page(all: Vec<Entity>, offset: usize, limit: Option<usize>) -> Self {
        let total = all.len() as u64;
        let page = all.into_iter().skip(offset);
        let items = match limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        };
        Self { items, total }
    }

    #[must_use]
    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    /// Size of the full set, independent of any limit/offset
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Output of a controller handler prior to serialization
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    SingleEntity(Entity),
    Collection(Collection),
    /// Untyped map or array
    PlainStructure(Value),
    /// Scalar or string passed through as-is; `Null` is the empty result
    Opaque(Value),
}

impl RawResult {
    /// The empty result, returned by handlers with nothing to say and by
    /// rejected named actions
    #[must_use]
    pub fn null() -> Self {
        RawResult::Opaque(Value::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RawResult::Opaque(Value::Null))
    }

    /// Short variant name for log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RawResult::SingleEntity(_) => "entity",
            RawResult::Collection(_) => "collection",
            RawResult::PlainStructure(_) => "plain",
            RawResult::Opaque(_) => "opaque",
        }
    }
}

impl From<Entity> for RawResult {
    fn from(entity: Entity) -> Self {
        RawResult::SingleEntity(entity)
    }
}

impl From<Option<Entity>> for RawResult {
    fn from(entity: Option<Entity>) -> Self {
        entity.map_or_else(RawResult::null, RawResult::SingleEntity)
    }
}

impl From<Collection> for RawResult {
    fn from(collection: Collection) -> Self {
        RawResult::Collection(collection)
    }
}

impl From<Value> for RawResult {
    /// Objects and arrays become plain structures, everything else is opaque
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => RawResult::PlainStructure(value),
            other => RawResult::Opaque(other),
        }
    }
}

impl From<String> for RawResult {
    fn from(s: String) -> Self {
        RawResult::Opaque(Value::String(s))
    }
}

impl From<()> for RawResult {
    fn from(_: ()) -> Self {
        RawResult::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: i64) -> Entity {
        let mut fields = Map::new();
        fields.insert("ID".into(), json!(id));
        fields.insert("Title".into(), json!(format!("Item {id}")));
        Entity::new("Item", fields)
    }

    #[test]
    fn test_page_keeps_unlimited_total() {
        let all = (1..=5).map(entity).collect();
        let page = Collection::page(all, 1, Some(2));
        assert_eq!(page.len(), 2);
        assert_eq!(page.total(), 5);
        assert_eq!(page.items()[0].id(), Some(2));
    }

    #[test]
    fn test_page_past_end() {
        let all = (1..=3).map(entity).collect();
        let page = Collection::page(all, 10, None);
        assert!(page.is_empty());
        assert_eq!(page.total(), 3);
    }

    #[test]
    fn test_update_never_touches_id() {
        let mut item = entity(7);
        let data = json!({"ID": 99, "Title": "Renamed", "Subtitle": "New"});
        item.update(data.as_object().unwrap());
        assert_eq!(item.id(), Some(7));
        assert_eq!(item.get("Title"), Some(&json!("Renamed")));
        assert_eq!(item.get("Subtitle"), Some(&json!("New")));
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(RawResult::from(json!({"a": 1})).kind(), "plain");
        assert_eq!(RawResult::from(json!([1, 2])).kind(), "plain");
        assert_eq!(RawResult::from(json!(3)).kind(), "opaque");
        assert!(RawResult::from(()).is_null());
        assert!(RawResult::from(None::<Entity>).is_null());
    }

    #[test]
    fn test_from_serializable_rejects_scalars() {
        assert!(Entity::from_serializable("X", &42).is_err());
        let e = Entity::from_serializable("X", &json!({"ID": 1})).unwrap();
        assert_eq!(e.id(), Some(1));
        assert_eq!(e.type_name(), "X");
    }
}
