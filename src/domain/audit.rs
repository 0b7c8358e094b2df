use {
    super::{
        event::{EventType, fields},
        record::Record,
    },
    chrono::{DateTime, SecondsFormat, Utc},
    uuid::Uuid,
};

/// Request and auth metadata a capture hook attaches to an entry. Every
/// populated value is copied onto the entry as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditExtras {
    pub user_id: Option<String>,
    pub auth_method: Option<String>,
    pub request_method: Option<String>,
    pub request_ip: Option<String>,
    pub request_url: Option<String>,
}

/// One audit row, assembled by the logger and written once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub id: Uuid,
    pub event_type: EventType,
    pub collection_name: String,
    pub record_id: String,
    pub user_id: Option<String>,
    pub auth_method: Option<String>,
    pub request_method: Option<String>,
    pub request_ip: Option<String>,
    pub request_url: Option<String>,
    pub before_changes: Option<String>,
    pub after_changes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn new(
        event_type: EventType,
        collection_name: impl Into<String>,
        record_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type,
            collection_name: collection_name.into(),
            record_id: record_id.into(),
            user_id: None,
            auth_method: None,
            request_method: None,
            request_ip: None,
            request_url: None,
            before_changes: None,
            after_changes: None,
            timestamp,
        }
    }

    pub fn apply_extras(&mut self, extras: AuditExtras) {
        let AuditExtras {
            user_id,
            auth_method,
            request_method,
            request_ip,
            request_url,
        } = extras;
        if user_id.is_some() {
            self.user_id = user_id;
        }
        if auth_method.is_some() {
            self.auth_method = auth_method;
        }
        if request_method.is_some() {
            self.request_method = request_method;
        }
        if request_ip.is_some() {
            self.request_ip = request_ip;
        }
        if request_url.is_some() {
            self.request_url = request_url;
        }
    }

    /// The row as a record of the audit collection. Absent optionals are left
    /// out; `created`/`updated` are stamped by the store.
    pub fn to_record(&self, audit_collection: &str) -> Record {
        let mut record = Record::new(audit_collection, self.id.simple().to_string())
            .with_field(fields::EVENT_TYPE, self.event_type.as_str())
            .with_field(fields::COLLECTION_NAME, self.collection_name.as_str())
            .with_field(fields::RECORD_ID, self.record_id.as_str())
            .with_field(
                fields::TIMESTAMP,
                self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            );

        let optional = [
            (fields::USER_ID, &self.user_id),
            (fields::AUTH_METHOD, &self.auth_method),
            (fields::REQUEST_METHOD, &self.request_method),
            (fields::REQUEST_IP, &self.request_ip),
            (fields::REQUEST_URL, &self.request_url),
            (fields::BEFORE_CHANGES, &self.before_changes),
            (fields::AFTER_CHANGES, &self.after_changes),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                record.set(key, value.as_str());
            }
        }
        record
    }
}
