use {
    super::{
        extractor::{EventSource, extract},
        logger::{AuditLogger, LogOutcome},
    },
    crate::domain::{
        audit::AuditExtras,
        error::AuditError,
        event::{EventType, HookPoint},
        hook_event::{AuthEvent, PlatformEvent, RecordEvent, RecordRequestEvent},
        record::Record,
    },
    std::collections::HashSet,
};

/// Adapters from platform events to the audit logger.
///
/// Hooks only observe: whatever goes wrong while auditing is logged and
/// dropped, and the triggering operation carries on.
pub struct AuditHooks {
    logger: AuditLogger,
    points: HashSet<HookPoint>,
}

impl AuditHooks {
    /// Hooks with nothing registered yet.
    pub fn new(logger: AuditLogger) -> Self {
        Self {
            logger,
            points: HashSet::new(),
        }
    }

    pub fn register(&mut self, points: &[HookPoint]) {
        self.points.extend(points.iter().copied());
    }

    pub fn is_registered(&self, point: HookPoint) -> bool {
        self.points.contains(&point)
    }

    pub fn logger(&self) -> &AuditLogger {
        &self.logger
    }

    /// Route an event to its hook if that hook point is registered.
    pub async fn dispatch(&self, event: &PlatformEvent) {
        if !self.is_registered(event.hook_point()) {
            return;
        }
        match event {
            PlatformEvent::AfterCreateSuccess(e) => self.on_record_after_create_success(e).await,
            PlatformEvent::AfterUpdateSuccess(e) => self.on_record_after_update_success(e).await,
            PlatformEvent::AfterDeleteSuccess(e) => self.on_record_after_delete_success(e).await,
            PlatformEvent::CreateRequest(e) => self.on_record_create_request(e).await,
            PlatformEvent::UpdateRequest(e) => self.on_record_update_request(e).await,
            PlatformEvent::DeleteRequest(e) => self.on_record_delete_request(e).await,
            PlatformEvent::AuthRequest(e) => self.on_record_auth_request(e).await,
        }
    }

    fn is_audit_collection(&self, name: &str) -> bool {
        name == self.logger.config().collection_name
    }

    pub async fn on_record_after_create_success(&self, e: &RecordEvent) {
        let collection = e.record.collection();
        if self.is_audit_collection(collection) {
            return;
        }
        let result = self
            .logger
            .log_event(Some(&e.record), None, collection, EventType::Create, AuditExtras::default())
            .await;
        report(result, EventType::Create, &e.record);
    }

    /// Only the after-state is recorded: at this point the previous version
    /// is already overwritten.
    pub async fn on_record_after_update_success(&self, e: &RecordEvent) {
        let collection = e.record.collection();
        if self.is_audit_collection(collection) {
            return;
        }
        let result = self
            .logger
            .log_event(Some(&e.record), None, collection, EventType::Update, AuditExtras::default())
            .await;
        report(result, EventType::Update, &e.record);
    }

    pub async fn on_record_after_delete_success(&self, e: &RecordEvent) {
        let collection = e.record.collection();
        if self.is_audit_collection(collection) {
            return;
        }
        let result = self
            .logger
            .log_event(None, Some(&e.record), collection, EventType::Delete, AuditExtras::default())
            .await;
        report(result, EventType::Delete, &e.record);
    }

    pub async fn on_record_create_request(&self, e: &RecordRequestEvent) {
        if self.is_audit_collection(&e.collection) {
            return;
        }
        let extras = extract(EventSource::Request(e)).into_extras();
        let result = self
            .logger
            .log_event(Some(&e.record), None, &e.collection, EventType::CreateRequest, extras)
            .await;
        report(result, EventType::CreateRequest, &e.record);
    }

    /// Runs before the change is written, so the stored record is still the
    /// previous version and is read back as the before-state.
    pub async fn on_record_update_request(&self, e: &RecordRequestEvent) {
        if self.is_audit_collection(&e.collection) {
            return;
        }

        let before = match self
            .logger
            .store()
            .find_record_by_id(&e.collection, e.record.id())
            .await
        {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                tracing::warn!(
                    collection = %e.collection,
                    record_id = %e.record.id(),
                    "original record not found, logging update without before-state"
                );
                None
            }
            Err(err) => {
                tracing::warn!(
                    collection = %e.collection,
                    record_id = %e.record.id(),
                    error = %err,
                    "failed to load original record for update tracking"
                );
                None
            }
        };

        let extras = extract(EventSource::Request(e)).into_extras();
        let result = self
            .logger
            .log_event(
                Some(&e.record),
                before.as_ref(),
                &e.collection,
                EventType::UpdateRequest,
                extras,
            )
            .await;
        report(result, EventType::UpdateRequest, &e.record);
    }

    pub async fn on_record_delete_request(&self, e: &RecordRequestEvent) {
        if self.is_audit_collection(&e.collection) {
            return;
        }
        let extras = extract(EventSource::Request(e)).into_extras();
        let result = self
            .logger
            .log_event(None, Some(&e.record), &e.collection, EventType::DeleteRequest, extras)
            .await;
        report(result, EventType::DeleteRequest, &e.record);
    }

    /// The authenticated record is both the principal and the after-state.
    pub async fn on_record_auth_request(&self, e: &AuthEvent) {
        let extras = AuditExtras {
            auth_method: Some(e.auth_method.clone()),
            ..extract(EventSource::Auth(e)).into_extras()
        };
        let result = self
            .logger
            .log_event(Some(&e.record), None, e.record.collection(), EventType::Auth, extras)
            .await;
        report(result, EventType::Auth, &e.record);
    }
}

fn report(result: Result<LogOutcome, AuditError>, event_type: EventType, record: &Record) {
    match result {
        Ok(LogOutcome::Logged(_)) => {}
        Ok(LogOutcome::Skipped) => {
            tracing::trace!(
                event_type = %event_type,
                collection = %record.collection(),
                "event filtered out"
            );
        }
        Err(e) => {
            tracing::error!(
                event_type = %event_type,
                collection = %record.collection(),
                record_id = %record.id(),
                error = %e,
                "failed to log audit event"
            );
        }
    }
}
