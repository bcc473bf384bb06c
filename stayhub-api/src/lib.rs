use axum::{
    http::{header, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod contacts;
pub mod error;
pub mod health;
pub mod state;
pub mod telemetry;
pub mod upload;

pub use error::{AppError, StartupError};
pub use state::AppState;

/// The full HTTP surface, mounted under `/api`.
pub fn app(state: AppState) -> Router {
    // The storefront and admin panel are served from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let api = Router::new()
        .merge(health::routes())
        .merge(bookings::routes())
        .merge(contacts::routes())
        .merge(upload::routes(state.max_upload_bytes));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
