use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod bookings;
pub mod doc;
pub mod health;
pub mod params;
pub mod payments;
pub mod tutors;
pub mod wilayah;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/wilayah", wilayah::router())
        .nest("/tutors", tutors::router())
        .nest("/bookings", bookings::router())
        .nest("/payments", payments::router())
        .nest("/admin", admin::router())
}
