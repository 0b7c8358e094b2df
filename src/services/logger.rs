use {
    crate::domain::{
        audit::{AuditExtras, NewAuditEntry},
        config::AuditConfig,
        error::AuditError,
        event::EventType,
        record::Record,
        store::RecordStore,
    },
    chrono::Utc,
    std::sync::Arc,
    uuid::Uuid,
};

/// Fields consulted, in order, when no principal came with the request.
const USER_FIELDS: [&str; 2] = ["user", "created_by"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// Entry written with this id.
    Logged(Uuid),
    /// Policy excluded the event; nothing written.
    Skipped,
}

/// Applies the audit policy and writes one entry per accepted event.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn RecordStore>,
    config: Arc<AuditConfig>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<AuditConfig>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        &*self.store
    }

    /// The audit collection never audits itself; otherwise the configured
    /// filter decides, and without one everything is logged.
    pub fn should_log(&self, collection_name: &str, event_type: EventType) -> bool {
        if collection_name == self.config.collection_name {
            return false;
        }
        match &self.config.event_filter {
            Some(filter) => filter(collection_name, event_type),
            None => true,
        }
    }

    /// Assemble and persist one audit entry. `after` is the record state
    /// after the operation, `before` the state prior to it when known.
    pub async fn log_event(
        &self,
        after: Option<&Record>,
        before: Option<&Record>,
        collection_name: &str,
        event_type: EventType,
        extras: AuditExtras,
    ) -> Result<LogOutcome, AuditError> {
        if !self.should_log(collection_name, event_type) {
            return Ok(LogOutcome::Skipped);
        }

        let audit_name = self.config.collection_name.as_str();
        let audit_collection = match self.store.find_collection_by_name(audit_name).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                tracing::error!(collection = %audit_name, "audit collection not found");
                return Err(AuditError::CollectionNotFound(audit_name.to_string()));
            }
            Err(e) => {
                tracing::error!(
                    collection = %audit_name,
                    error = %e,
                    "audit collection lookup failed"
                );
                return Err(e);
            }
        };

        let record_id = after.or(before).map(Record::id).ok_or_else(|| {
            AuditError::Validation(format!(
                "{event_type} event on {collection_name} has neither before nor after state"
            ))
        })?;

        let mut entry = NewAuditEntry::new(event_type, collection_name, record_id, Utc::now());
        entry.apply_extras(extras);

        if entry.user_id.is_none() {
            entry.user_id = resolve_user_id(after, before);
        }

        entry.before_changes = before.and_then(|r| snapshot_or_warn(r, "before"));
        entry.after_changes = after.and_then(|r| snapshot_or_warn(r, "after"));

        let row = entry.to_record(audit_collection.name());
        if let Err(e) = self.store.save(&row).await {
            tracing::error!(
                event_type = %event_type,
                collection = %collection_name,
                record_id = %entry.record_id,
                error = %e,
                "failed to save audit entry"
            );
            return Err(e);
        }

        if self.config.log_to_console {
            tracing::info!(
                event_type = %event_type,
                collection = %collection_name,
                record_id = %entry.record_id,
                "audit entry created"
            );
        } else {
            tracing::debug!(
                event_type = %event_type,
                collection = %collection_name,
                record_id = %entry.record_id,
                "audit entry created"
            );
        }

        Ok(LogOutcome::Logged(entry.id))
    }
}

/// After-state before before-state; within a record `user` before `created_by`.
fn resolve_user_id(after: Option<&Record>, before: Option<&Record>) -> Option<String> {
    [after, before]
        .into_iter()
        .flatten()
        .find_map(|record| USER_FIELDS.iter().find_map(|field| record.text(field)))
}

fn snapshot_or_warn(record: &Record, side: &str) -> Option<String> {
    match record.snapshot() {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(
                record_id = %record.id(),
                side,
                error = %e,
                "failed to serialize record snapshot"
            );
            None
        }
    }
}
