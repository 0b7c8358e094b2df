use {
    super::{
        hooks::AuditHooks,
        logger::AuditLogger,
        provisioner::{ensure_audit_collection, import_collections_from_file},
    },
    crate::domain::{
        config::AuditConfig, error::AuditError, event::HookPoint, store::RecordStore,
    },
    std::{path::Path, sync::Arc},
};

/// Provision the audit collection, import the optional schema file and
/// register the enabled hook groups.
///
/// Failing to create the audit collection is always an error. A failed
/// schema import is only an error with `fail_on_schema_error`.
pub async fn setup(
    store: Arc<dyn RecordStore>,
    config: AuditConfig,
) -> Result<AuditHooks, AuditError> {
    let config = Arc::new(config.normalized());
    let audit_collection = config.collection_name.as_str();

    if config.create_audit_collection {
        if let Err(e) = ensure_audit_collection(&*store, audit_collection).await {
            tracing::warn!(
                collection = %audit_collection,
                error = %e,
                "failed to set up audit collection"
            );
            return Err(e);
        }
    }

    if !config.schema_path.is_empty() {
        let path = Path::new(&config.schema_path);
        if let Err(e) = import_collections_from_file(&*store, path, audit_collection).await {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to import collections from schema"
            );
            if config.fail_on_schema_error {
                return Err(e);
            }
        }
    }

    let mut hooks = AuditHooks::new(AuditLogger::new(store, config.clone()));

    if config.enable_standard_events {
        hooks.register(&HookPoint::STANDARD);
        tracing::info!("audit: standard event hooks registered");
    }
    if config.enable_request_events {
        hooks.register(&HookPoint::REQUEST);
        tracing::info!("audit: request event hooks registered");
    }
    if config.enable_auth_events {
        hooks.register(&HookPoint::AUTH);
        tracing::info!("audit: auth event hooks registered");
    }

    tracing::info!(collection = %audit_collection, "audit logging initialized");
    Ok(hooks)
}
