use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uniride_api::{app, AppState, AuthConfig};
use uniride_core::NegotiationService;
use uniride_geo::{HttpGeocodingClient, HttpRoutingClient};
use uniride_store::{DbClient, PostgresReservationRepository, PostgresTripRepository};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uniride_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = uniride_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting UniRide API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let reservations = Arc::new(PostgresReservationRepository {
        pool: db.pool.clone(),
    });
    let trips = Arc::new(PostgresTripRepository {
        pool: db.pool.clone(),
    });
    let service = NegotiationService::new(reservations, trips);

    let geo_timeout = Duration::from_secs(config.geo.timeout_seconds);
    let routing = Arc::new(
        HttpRoutingClient::new(
            &config.geo.routing_url,
            &config.geo.api_key,
            &config.geo.mode,
            geo_timeout,
        )
        .expect("Failed to build routing HTTP client"),
    );
    let geocoding = Arc::new(
        HttpGeocodingClient::new(&config.geo.geocoding_url, &config.geo.api_key, geo_timeout)
            .expect("Failed to build geocoding HTTP client"),
    );

    let app_state = AppState {
        service,
        routing,
        geocoding,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
