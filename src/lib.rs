pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use {
    domain::{hook_event::PlatformEvent, store::RecordStore},
    services::hooks::AuditHooks,
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// `None` when audit setup failed and the server runs without it.
    pub hooks: Option<Arc<AuditHooks>>,
    /// Audit rows are written by the hooks only, never through the record API.
    pub audit_collection: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        hooks: Option<AuditHooks>,
        audit_collection: &str,
    ) -> Self {
        Self {
            store,
            hooks: hooks.map(Arc::new),
            audit_collection: Arc::from(audit_collection),
        }
    }

    pub fn is_audit_collection(&self, collection: &str) -> bool {
        &*self.audit_collection == collection
    }

    /// Hand an event to the audit hooks. Inline: the caller resumes once the
    /// hook has finished, and nothing the hook does can fail the caller.
    pub async fn emit(&self, event: PlatformEvent) {
        if let Some(hooks) = &self.hooks {
            hooks.dispatch(&event).await;
        }
    }
}
