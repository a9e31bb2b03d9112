use axum::http::{header, HeaderName, HeaderValue, Method};
use axum_login::tower_sessions::{Expiry, SessionManagerLayer};
use axum_login::AuthManagerLayerBuilder;
use log::*;
use time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_sessions::cookie::SameSite;
use tower_sessions_sqlx_store::PostgresStore;

use domain::user::Backend;

pub use service::AppState;

pub(crate) mod controller;
pub(crate) mod error;
pub(crate) mod extractors;
pub(crate) mod middleware;
pub(crate) mod params;
pub mod router;

pub use error::{Error, Result};

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = app_state.config.port;
    let listen_addr = format!("{host}:{port}");

    // Session records live in Postgres next to the application data, reusing
    // the SeaORM connection's underlying sqlx pool.
    let pool = app_state.db_conn_ref().get_postgres_connection_pool().clone();
    let session_store = PostgresStore::new(pool);
    session_store
        .migrate()
        .await
        .expect("Failed to run session store migrations");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(app_state.config.is_production())
        .with_same_site(SameSite::Strict)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            app_state.config.backend_session_expiry_seconds as i64,
        )));

    let backend = Backend::new(&app_state.database_connection);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-version"),
        ]);

    info!("Server starting... listening for requests on http://{listen_addr}");

    let app = router::define_routes(app_state)
        .layer(cors_layer)
        .layer(auth_layer);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app).await
}
