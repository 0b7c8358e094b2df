use {
    crate::domain::{
        audit::AuditExtras,
        hook_event::{AuthEvent, RecordEvent, RecordRequestEvent, RequestInfo},
    },
    axum::http::HeaderMap,
};

pub const UNKNOWN_IP: &str = "unknown";

/// Proxy headers consulted after the platform's own client address, in order.
/// `x-forwarded-for` contributes only its first hop.
const IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Request metadata derived from a platform event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub user_id: Option<String>,
}

impl RequestContext {
    fn unknown() -> Self {
        Self {
            ip: UNKNOWN_IP.to_string(),
            method: None,
            path: None,
            user_id: None,
        }
    }

    pub fn into_extras(self) -> AuditExtras {
        AuditExtras {
            user_id: self.user_id,
            request_method: self.method,
            request_ip: Some(self.ip),
            request_url: self.path,
            ..AuditExtras::default()
        }
    }
}

/// The event shapes extraction understands.
#[derive(Debug, Clone, Copy)]
pub enum EventSource<'a> {
    Lifecycle(&'a RecordEvent),
    Request(&'a RecordRequestEvent),
    Auth(&'a AuthEvent),
}

/// Derive client IP, method, path and principal. Never fails: missing
/// request metadata degrades to the IP alone.
pub fn extract(source: EventSource<'_>) -> RequestContext {
    match source {
        // Storage events carry no request.
        EventSource::Lifecycle(_) => RequestContext::unknown(),
        EventSource::Request(e) => {
            let mut ctx = from_request(e.real_ip.as_deref(), e.request.as_ref());
            ctx.user_id = e
                .request
                .as_ref()
                .and_then(|r| r.auth.as_ref())
                .map(|a| a.id.clone());
            ctx
        }
        EventSource::Auth(e) => {
            let mut ctx = from_request(e.real_ip.as_deref(), e.request.as_ref());
            ctx.user_id = Some(e.record.id().to_string());
            ctx
        }
    }
}

fn from_request(real_ip: Option<&str>, request: Option<&RequestInfo>) -> RequestContext {
    let Some(request) = request else {
        tracing::warn!("request info unavailable, recording client address only");
        return RequestContext {
            ip: non_empty(real_ip).unwrap_or(UNKNOWN_IP).to_string(),
            ..RequestContext::unknown()
        };
    };

    RequestContext {
        ip: client_ip(real_ip, &request.headers),
        method: Some(request.method.as_str().to_string()),
        path: Some(request.context.clone()),
        user_id: None,
    }
}

/// Resolve the client address: platform value first, then proxy headers,
/// else `"unknown"`. Header names match case-insensitively.
pub fn client_ip(real_ip: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(ip) = non_empty(real_ip) {
        return ip.to_string();
    }

    IP_HEADERS
        .iter()
        .find_map(|name| {
            let value = headers.get(*name)?.to_str().ok()?;
            let value = match *name {
                "x-forwarded-for" => value.split(',').next().unwrap_or_default(),
                _ => value,
            };
            non_empty(Some(value.trim())).map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
