use {
    derive_more::Display,
    serde::{Deserialize, Serialize},
};

/// Field names of the audit collection. These are a storage contract for
/// anything that queries audit rows, renaming one needs a migration.
pub mod fields {
    pub const EVENT_TYPE: &str = "event_type";
    pub const COLLECTION_NAME: &str = "collection_name";
    pub const RECORD_ID: &str = "record_id";
    pub const USER_ID: &str = "user_id";
    pub const AUTH_METHOD: &str = "auth_method";
    pub const REQUEST_METHOD: &str = "request_method";
    pub const REQUEST_IP: &str = "request_ip";
    pub const REQUEST_URL: &str = "request_url";
    pub const TIMESTAMP: &str = "timestamp";
    pub const BEFORE_CHANGES: &str = "before_changes";
    pub const AFTER_CHANGES: &str = "after_changes";
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
}

pub const DEFAULT_COLLECTION_NAME: &str = "audit_logs";

/// Which capture path produced an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[display("create")]
    Create,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("create_request")]
    CreateRequest,
    #[display("update_request")]
    UpdateRequest,
    #[display("delete_request")]
    DeleteRequest,
    #[display("auth")]
    Auth,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::CreateRequest,
        Self::UpdateRequest,
        Self::DeleteRequest,
        Self::Auth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::CreateRequest => "create_request",
            Self::UpdateRequest => "update_request",
            Self::DeleteRequest => "delete_request",
            Self::Auth => "auth",
        }
    }
}

/// Subscription points the audit hooks can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum HookPoint {
    AfterCreateSuccess,
    AfterUpdateSuccess,
    AfterDeleteSuccess,
    CreateRequest,
    UpdateRequest,
    DeleteRequest,
    AuthRequest,
}

impl HookPoint {
    pub const STANDARD: [HookPoint; 3] = [
        Self::AfterCreateSuccess,
        Self::AfterUpdateSuccess,
        Self::AfterDeleteSuccess,
    ];

    pub const REQUEST: [HookPoint; 3] =
        [Self::CreateRequest, Self::UpdateRequest, Self::DeleteRequest];

    pub const AUTH: [HookPoint; 1] = [Self::AuthRequest];
}
