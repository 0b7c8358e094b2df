use {
    super::{
        error::AuditError,
        event::{DEFAULT_COLLECTION_NAME, EventType},
    },
    std::{collections::HashSet, fmt, sync::Arc},
};

/// Decides per (collection, event type) whether an entry is written.
/// Returning `false` suppresses the entry.
pub type EventFilter = Arc<dyn Fn(&str, EventType) -> bool + Send + Sync>;

/// Audit options. Built once at startup, then shared read-only by the
/// logger and the hooks.
#[derive(Clone)]
pub struct AuditConfig {
    pub collection_name: String,
    /// Lifecycle create/update/delete hooks.
    pub enable_standard_events: bool,
    /// API request create/update/delete hooks.
    pub enable_request_events: bool,
    pub enable_auth_events: bool,
    pub event_filter: Option<EventFilter>,
    /// JSON file of collection definitions to import at startup. Empty disables.
    pub schema_path: String,
    pub create_audit_collection: bool,
    pub fail_on_schema_error: bool,
    /// Echo a one-line summary of every written entry.
    pub log_to_console: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            enable_standard_events: true,
            enable_request_events: true,
            enable_auth_events: true,
            event_filter: None,
            schema_path: String::new(),
            create_audit_collection: true,
            fail_on_schema_error: false,
            log_to_console: true,
        }
    }
}

impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field("collection_name", &self.collection_name)
            .field("enable_standard_events", &self.enable_standard_events)
            .field("enable_request_events", &self.enable_request_events)
            .field("enable_auth_events", &self.enable_auth_events)
            .field("event_filter", &self.event_filter.as_ref().map(|_| "<fn>"))
            .field("schema_path", &self.schema_path)
            .field("create_audit_collection", &self.create_audit_collection)
            .field("fail_on_schema_error", &self.fail_on_schema_error)
            .field("log_to_console", &self.log_to_console)
            .finish()
    }
}

impl AuditConfig {
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, EventType) -> bool + Send + Sync + 'static,
    {
        self.event_filter = Some(Arc::new(filter));
        self
    }

    /// Fill in defaults for values left empty. An empty collection name is
    /// corrected rather than rejected.
    pub fn normalized(mut self) -> Self {
        if self.collection_name.trim().is_empty() {
            self.collection_name = DEFAULT_COLLECTION_NAME.to_string();
        }
        self
    }

    pub fn from_env() -> Result<Self, AuditError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from `AUDIT_*` variables through `lookup`; unset variables keep
    /// their defaults.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AuditError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| -> Result<bool, AuditError> {
            lookup(key).map_or(Ok(default), |v| parse_bool(key, &v))
        };

        let mut config = Self {
            collection_name: lookup("AUDIT_COLLECTION_NAME").unwrap_or(defaults.collection_name),
            enable_standard_events: flag(
                "AUDIT_ENABLE_STANDARD_EVENTS",
                defaults.enable_standard_events,
            )?,
            enable_request_events: flag(
                "AUDIT_ENABLE_REQUEST_EVENTS",
                defaults.enable_request_events,
            )?,
            enable_auth_events: flag("AUDIT_ENABLE_AUTH_EVENTS", defaults.enable_auth_events)?,
            event_filter: None,
            schema_path: lookup("AUDIT_SCHEMA_PATH").unwrap_or(defaults.schema_path),
            create_audit_collection: flag(
                "AUDIT_CREATE_COLLECTION",
                defaults.create_audit_collection,
            )?,
            fail_on_schema_error: flag(
                "AUDIT_FAIL_ON_SCHEMA_ERROR",
                defaults.fail_on_schema_error,
            )?,
            log_to_console: flag("AUDIT_LOG_TO_CONSOLE", defaults.log_to_console)?,
        };

        if let Some(list) = lookup("AUDIT_EXCLUDE_COLLECTIONS") {
            let excluded: HashSet<String> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !excluded.is_empty() {
                config = config.with_filter(move |collection, _| !excluded.contains(collection));
            }
        }

        Ok(config.normalized())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AuditError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AuditError::Configuration(format!(
            "{key} must be a boolean, got: {other}"
        ))),
    }
}
