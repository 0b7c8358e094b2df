use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use record_audit::domain::hook_event::{
    AuthEvent, AuthPrincipal, RecordEvent, RecordRequestEvent, RequestInfo,
};
use record_audit::domain::record::Record;
use record_audit::services::extractor::{EventSource, UNKNOWN_IP, client_ip, extract};

fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

// ── ip precedence ──────────────────────────────────────────────────────────

#[test]
fn cloudflare_header_beats_forwarded_for() {
    let h = headers(&[
        ("cf-connecting-ip", "1.1.1.1"),
        ("x-forwarded-for", "2.2.2.2, 3.3.3.3"),
    ]);
    assert_eq!(client_ip(None, &h), "1.1.1.1");
}

#[test]
fn forwarded_for_yields_first_hop() {
    let h = headers(&[("x-forwarded-for", "2.2.2.2, 3.3.3.3")]);
    assert_eq!(client_ip(None, &h), "2.2.2.2");
}

#[test]
fn real_ip_header_then_fly_header() {
    let h = headers(&[("x-real-ip", "4.4.4.4"), ("fly-client-ip", "5.5.5.5")]);
    assert_eq!(client_ip(None, &h), "4.4.4.4");

    let h = headers(&[("fly-client-ip", "5.5.5.5")]);
    assert_eq!(client_ip(None, &h), "5.5.5.5");
}

#[test]
fn header_names_match_case_insensitively() {
    let h = headers(&[("CF-Connecting-IP", "1.1.1.1")]);
    assert_eq!(client_ip(None, &h), "1.1.1.1");
}

#[test]
fn platform_address_wins() {
    let h = headers(&[("cf-connecting-ip", "1.1.1.1")]);
    assert_eq!(client_ip(Some("7.7.7.7"), &h), "7.7.7.7");
}

#[test]
fn empty_values_are_skipped() {
    let h = headers(&[("cf-connecting-ip", ""), ("x-real-ip", "4.4.4.4")]);
    assert_eq!(client_ip(Some(""), &h), "4.4.4.4");
}

#[test]
fn no_source_yields_unknown() {
    assert_eq!(client_ip(None, &HeaderMap::new()), UNKNOWN_IP);
}

// ── event dispatch ─────────────────────────────────────────────────────────

#[test]
fn request_event_extracts_method_path_and_principal() {
    let event = RecordRequestEvent {
        collection: "widgets".into(),
        record: Record::new("widgets", "w1"),
        real_ip: None,
        request: Some(
            RequestInfo::new(Method::PATCH, "/api/collections/widgets/records/w1")
                .with_headers(headers(&[("x-real-ip", "4.4.4.4")]))
                .with_auth(AuthPrincipal {
                    id: "U1".into(),
                    collection: "users".into(),
                }),
        ),
    };

    let ctx = extract(EventSource::Request(&event));
    assert_eq!(ctx.ip, "4.4.4.4");
    assert_eq!(ctx.method.as_deref(), Some("PATCH"));
    assert_eq!(ctx.path.as_deref(), Some("/api/collections/widgets/records/w1"));
    assert_eq!(ctx.user_id.as_deref(), Some("U1"));
}

#[test]
fn request_event_without_metadata_keeps_platform_ip() {
    let event = RecordRequestEvent {
        collection: "widgets".into(),
        record: Record::new("widgets", "w1"),
        real_ip: Some("8.8.8.8".into()),
        request: None,
    };

    let ctx = extract(EventSource::Request(&event));
    assert_eq!(ctx.ip, "8.8.8.8");
    assert!(ctx.method.is_none());
    assert!(ctx.path.is_none());
    assert!(ctx.user_id.is_none());
}

#[test]
fn auth_event_principal_is_the_record() {
    let event = AuthEvent {
        record: Record::new("users", "U3"),
        auth_method: "password".into(),
        real_ip: None,
        request: Some(RequestInfo::new(Method::POST, "/auth")),
    };

    let ctx = extract(EventSource::Auth(&event));
    assert_eq!(ctx.user_id.as_deref(), Some("U3"));
    assert_eq!(ctx.ip, UNKNOWN_IP);
    assert_eq!(ctx.method.as_deref(), Some("POST"));
}

#[test]
fn lifecycle_event_has_no_request_context() {
    let event = RecordEvent {
        record: Record::new("widgets", "w1"),
    };

    let ctx = extract(EventSource::Lifecycle(&event));
    assert_eq!(ctx.ip, UNKNOWN_IP);
    assert!(ctx.method.is_none());
    assert!(ctx.user_id.is_none());
}

#[test]
fn context_converts_to_extras() {
    let event = RecordRequestEvent {
        collection: "widgets".into(),
        record: Record::new("widgets", "w1"),
        real_ip: Some("6.6.6.6".into()),
        request: Some(RequestInfo::new(Method::POST, "/p")),
    };

    let extras = extract(EventSource::Request(&event)).into_extras();
    assert_eq!(extras.request_ip.as_deref(), Some("6.6.6.6"));
    assert_eq!(extras.request_method.as_deref(), Some("POST"));
    assert_eq!(extras.request_url.as_deref(), Some("/p"));
    assert!(extras.auth_method.is_none());
}
