use {
    super::api_errors::ApiError,
    crate::{
        AppState,
        domain::{
            error::AuditError,
            hook_event::{
                AuthEvent, AuthPrincipal, PlatformEvent, RecordEvent, RecordRequestEvent,
                RequestInfo,
            },
            record::Record,
        },
    },
    axum::{
        Json, Router,
        extract::{ConnectInfo, DefaultBodyLimit, FromRequestParts, Path, State},
        http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION, request::Parts},
        routing::{get, patch, post},
    },
    serde_json::{Map, Value},
    std::{convert::Infallible, net::SocketAddr, time::Duration},
    tower_http::timeout::TimeoutLayer,
    uuid::Uuid,
};

/// Collection bearer tokens are resolved against for request principals.
pub const USERS_COLLECTION: &str = "users";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/collections/{collection}/records", post(create_record))
        .route(
            "/api/collections/{collection}/records/{id}",
            patch(update_record).delete(delete_record),
        )
        .route(
            "/api/collections/{collection}/auth-with-token",
            post(auth_with_token),
        )
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state)
}

/// Request metadata captured before the body is consumed.
pub struct RequestMeta {
    method: Method,
    path: String,
    headers: HeaderMap,
    peer_ip: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
            peer_ip: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        })
    }
}

impl RequestMeta {
    fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    fn request_info(&self, auth: Option<AuthPrincipal>) -> RequestInfo {
        let info = RequestInfo::new(self.method.clone(), self.path.clone())
            .with_headers(self.headers.clone());
        match auth {
            Some(auth) => info.with_auth(auth),
            None => info,
        }
    }

    fn request_event(&self, record: &Record, auth: Option<AuthPrincipal>) -> RecordRequestEvent {
        RecordRequestEvent {
            collection: record.collection().to_string(),
            record: record.clone(),
            real_ip: self.peer_ip.clone(),
            request: Some(self.request_info(auth)),
        }
    }
}

/// Bearer token naming a record of the users collection. Unknown tokens
/// fall back to an anonymous request.
async fn resolve_principal(state: &AppState, meta: &RequestMeta) -> Option<AuthPrincipal> {
    let token = meta.bearer_token()?;
    match state.store.find_record_by_id(USERS_COLLECTION, token).await {
        Ok(Some(user)) => Some(AuthPrincipal {
            id: user.id().to_string(),
            collection: user.collection().to_string(),
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(error = %e, "could not resolve request principal");
            None
        }
    }
}

/// The audit collection is read-only through this API.
fn ensure_writable(state: &AppState, collection: &str) -> Result<(), ApiError> {
    if state.is_audit_collection(collection) {
        tracing::warn!(collection = %collection, "rejected write to audit collection");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

async fn load(state: &AppState, collection: &str, id: &str) -> Result<Record, ApiError> {
    state
        .store
        .find_record_by_id(collection, id)
        .await?
        .ok_or_else(|| {
            AuditError::RecordNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
            .into()
        })
}

#[tracing::instrument(name = "create_record", skip_all, fields(collection = %collection))]
pub async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    meta: RequestMeta,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Record>, ApiError> {
    ensure_writable(&state, &collection)?;
    if state.store.find_collection_by_name(&collection).await?.is_none() {
        return Err(AuditError::CollectionNotFound(collection).into());
    }

    let mut record = Record::new(&collection, Uuid::now_v7().simple().to_string());
    record.merge(body);

    let auth = resolve_principal(&state, &meta).await;
    state
        .emit(PlatformEvent::CreateRequest(meta.request_event(&record, auth)))
        .await;

    state.store.save(&record).await?;
    let saved = load(&state, &collection, record.id()).await?;

    state
        .emit(PlatformEvent::AfterCreateSuccess(RecordEvent {
            record: saved.clone(),
        }))
        .await;

    Ok(Json(saved))
}

#[tracing::instrument(
    name = "update_record",
    skip_all,
    fields(collection = %collection, record_id = %id)
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    meta: RequestMeta,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Record>, ApiError> {
    ensure_writable(&state, &collection)?;
    let mut record = load(&state, &collection, &id).await?;
    record.merge(body);

    let auth = resolve_principal(&state, &meta).await;
    state
        .emit(PlatformEvent::UpdateRequest(meta.request_event(&record, auth)))
        .await;

    state.store.save(&record).await?;
    let saved = load(&state, &collection, &id).await?;

    state
        .emit(PlatformEvent::AfterUpdateSuccess(RecordEvent {
            record: saved.clone(),
        }))
        .await;

    Ok(Json(saved))
}

#[tracing::instrument(
    name = "delete_record",
    skip_all,
    fields(collection = %collection, record_id = %id)
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    meta: RequestMeta,
) -> Result<StatusCode, ApiError> {
    ensure_writable(&state, &collection)?;
    let record = load(&state, &collection, &id).await?;

    let auth = resolve_principal(&state, &meta).await;
    state
        .emit(PlatformEvent::DeleteRequest(meta.request_event(&record, auth)))
        .await;

    state.store.delete(&record).await?;

    state
        .emit(PlatformEvent::AfterDeleteSuccess(RecordEvent { record }))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Authenticate as the record the bearer token names.
#[tracing::instrument(name = "auth_with_token", skip_all, fields(collection = %collection))]
pub async fn auth_with_token(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    meta: RequestMeta,
) -> Result<Json<Value>, ApiError> {
    let token = meta.bearer_token().ok_or(ApiError::Unauthorized)?;
    let record = match state.store.find_record_by_id(&collection, token).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(ApiError::Unauthorized),
        Err(e) => return Err(e.into()),
    };

    let principal = AuthPrincipal {
        id: record.id().to_string(),
        collection: record.collection().to_string(),
    };
    state
        .emit(PlatformEvent::AuthRequest(AuthEvent {
            record: record.clone(),
            auth_method: "token".to_string(),
            real_ip: meta.peer_ip.clone(),
            request: Some(meta.request_info(Some(principal))),
        }))
        .await;

    Ok(Json(serde_json::json!({ "record": record })))
}
