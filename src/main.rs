use {
    record_audit::{
        AppState, adapters::api, domain::config::AuditConfig, infra::postgres::PgStore,
        services::bootstrap::setup,
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, net::SocketAddr, sync::Arc, time::Duration},
    tokio::signal,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let config = AuditConfig::from_env().expect("invalid audit configuration");
    let fail_on_schema_error = config.fail_on_schema_error;
    let audit_collection = config.clone().normalized().collection_name;

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    let store = Arc::new(PgStore::new(pool));
    store.migrate().await.expect("failed to run migrations");

    let hooks = match setup(store.clone(), config).await {
        Ok(hooks) => Some(hooks),
        Err(e) if fail_on_schema_error => panic!("audit setup failed: {e}"),
        Err(e) => {
            tracing::warn!(error = %e, "audit setup failed, serving without audit logging");
            None
        }
    };

    let app = api::router(AppState::new(store, hooks, &audit_collection));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
