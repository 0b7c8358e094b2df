use {
    super::{error::AuditError, record::Record},
    chrono::{DateTime, SecondsFormat, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Json,
    Select,
    Date,
    Autodate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    /// Allowed values of a select field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default)]
    pub on_create: bool,
    #[serde(default)]
    pub on_update: bool,
}

impl FieldDefinition {
    fn of(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            values: Vec::new(),
            on_create: false,
            on_update: false,
        }
    }

    pub fn text(name: impl Into<String>, required: bool) -> Self {
        Self::of(name, FieldKind::Text, required)
    }

    pub fn date(name: impl Into<String>, required: bool) -> Self {
        Self::of(name, FieldKind::Date, required)
    }

    pub fn select<I, V>(name: impl Into<String>, required: bool, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::of(name, FieldKind::Select, required)
        }
    }

    /// System-managed timestamp, stamped by the store on insert and/or update.
    pub fn autodate(name: impl Into<String>, on_create: bool, on_update: bool) -> Self {
        Self {
            on_create,
            on_update,
            ..Self::of(name, FieldKind::Autodate, false)
        }
    }
}

/// Row-level access predicates, one per operation. `None` means the
/// operation is closed to everyone but superusers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRules {
    pub list_rule: Option<String>,
    pub view_rule: Option<String>,
    pub create_rule: Option<String>,
    pub update_rule: Option<String>,
    pub delete_rule: Option<String>,
}

impl AccessRules {
    /// The same predicate on every operation.
    pub fn uniform(rule: impl Into<String>) -> Self {
        let rule = rule.into();
        Self {
            list_rule: Some(rule.clone()),
            view_rule: Some(rule.clone()),
            create_rule: Some(rule.clone()),
            update_rule: Some(rule.clone()),
            delete_rule: Some(rule),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub name: String,
    #[serde(default)]
    pub rules: AccessRules,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: AccessRules::default(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: AccessRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_index(mut self, name: impl Into<String>, unique: bool, column: &str) -> Self {
        self.indexes.push(IndexDefinition {
            name: name.into(),
            columns: vec![column.to_string()],
            unique,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check required fields and select vocabularies.
    pub fn validate(&self, record: &Record) -> Result<(), AuditError> {
        for field in &self.fields {
            let value = record.get(&field.name);
            let present = match value {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            };

            if field.required && !present {
                return Err(AuditError::Validation(format!(
                    "{}.{} is required",
                    self.name, field.name
                )));
            }

            if field.kind == FieldKind::Select && present {
                let allowed = value
                    .and_then(Value::as_str)
                    .is_some_and(|v| field.values.iter().any(|a| a == v));
                if !allowed {
                    return Err(AuditError::Validation(format!(
                        "{}.{} must be one of {:?}",
                        self.name, field.name, field.values
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stamp autodate fields: `on_create` ones only for new records,
    /// `on_update` ones on every write.
    pub fn stamp_autodates(&self, record: &mut Record, now: DateTime<Utc>, is_new: bool) {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        for field in &self.fields {
            if field.kind != FieldKind::Autodate {
                continue;
            }
            let missing = matches!(record.get(&field.name), None | Some(Value::Null));
            if field.on_update || (field.on_create && (is_new || missing)) {
                record.set(field.name.clone(), stamp.clone());
            }
        }
    }
}

/// A collection as registered in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Uuid,
    pub definition: CollectionDefinition,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}
