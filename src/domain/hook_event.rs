use {
    super::{event::HookPoint, record::Record},
    axum::http::{HeaderMap, Method},
};

/// Authenticated principal attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPrincipal {
    pub id: String,
    pub collection: String,
}

/// Metadata of the inbound API call.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    /// Request path as routed.
    pub context: String,
    pub headers: HeaderMap,
    pub auth: Option<AuthPrincipal>,
}

impl RequestInfo {
    pub fn new(method: Method, context: impl Into<String>) -> Self {
        Self {
            method,
            context: context.into(),
            headers: HeaderMap::new(),
            auth: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_auth(mut self, auth: AuthPrincipal) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// Storage lifecycle event, delivered after the write committed.
#[derive(Debug, Clone)]
pub struct RecordEvent {
    pub record: Record,
}

/// API request event, delivered while the request is still in flight.
#[derive(Debug, Clone)]
pub struct RecordRequestEvent {
    pub collection: String,
    pub record: Record,
    /// Client address as seen by the platform itself, when it knows one.
    pub real_ip: Option<String>,
    /// `None` when the platform could not resolve request metadata.
    pub request: Option<RequestInfo>,
}

/// Successful authentication.
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub record: Record,
    pub auth_method: String,
    pub real_ip: Option<String>,
    pub request: Option<RequestInfo>,
}

/// Everything the host platform can deliver to the audit hooks.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    AfterCreateSuccess(RecordEvent),
    AfterUpdateSuccess(RecordEvent),
    AfterDeleteSuccess(RecordEvent),
    CreateRequest(RecordRequestEvent),
    UpdateRequest(RecordRequestEvent),
    DeleteRequest(RecordRequestEvent),
    AuthRequest(AuthEvent),
}

impl PlatformEvent {
    pub fn hook_point(&self) -> HookPoint {
        match self {
            Self::AfterCreateSuccess(_) => HookPoint::AfterCreateSuccess,
            Self::AfterUpdateSuccess(_) => HookPoint::AfterUpdateSuccess,
            Self::AfterDeleteSuccess(_) => HookPoint::AfterDeleteSuccess,
            Self::CreateRequest(_) => HookPoint::CreateRequest,
            Self::UpdateRequest(_) => HookPoint::UpdateRequest,
            Self::DeleteRequest(_) => HookPoint::DeleteRequest,
            Self::AuthRequest(_) => HookPoint::AuthRequest,
        }
    }
}
