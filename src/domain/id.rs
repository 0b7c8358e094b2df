use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::error::AuditError;

/// Postgres truncates longer names; they are rejected instead.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Collection or field name that is safe to splice into DDL as a quoted
/// identifier: ASCII letter or underscore, then letters, digits, underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self, AuditError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_head || !valid_tail || name.len() > MAX_IDENTIFIER_LEN {
            return Err(AuditError::Validation(format!(
                "invalid identifier: {name:?}"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for SQL.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = AuditError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
