use {
    super::error::AuditError,
    serde::{Serialize, Serializer, ser::SerializeMap},
    serde_json::{Map, Value},
};

/// A stored record: identifier, owning collection, and a free-form field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    collection: String,
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Overlay `patch` onto the current fields. `id` keys are ignored.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            if key != "id" {
                self.fields.insert(key, value);
            }
        }
    }

    /// Field value as text. Null and empty strings count as absent,
    /// non-string values are rendered as JSON.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Build from a flat row object (`{"id": .., field: ..}`) as read back
    /// from storage.
    pub fn from_row(collection: impl Into<String>, row: Value) -> Result<Self, AuditError> {
        let Value::Object(mut fields) = row else {
            return Err(AuditError::Storage("record row is not an object".into()));
        };
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(AuditError::Storage("record row has no string id".into())),
        };
        Ok(Self {
            id,
            collection: collection.into(),
            fields,
        })
    }

    /// Flat row object: the fields plus `id`.
    pub fn to_row(&self) -> Value {
        let mut row = self.fields.clone();
        row.insert("id".into(), Value::String(self.id.clone()));
        Value::Object(row)
    }

    /// Full field set as a JSON object string. Goes through a generic map so
    /// key order and value typing are normalized.
    pub fn snapshot(&self) -> Result<String, AuditError> {
        let value = serde_json::to_value(self)?;
        let map: Map<String, Value> = serde_json::from_value(value)?;
        Ok(serde_json::to_string(&map)?)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("collectionName", &self.collection)?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.fields {
            if key != "id" && key != "collectionName" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
