use axum::{
    routing::{get, post},
    Router,
};

use crate::{domain::communication::emails::EmailService, infrastructure::http::state::AppState};

use super::not_found;

pub mod health;
pub mod send_email;
pub mod test_connection;

/// The email routes, nested under `/api/{version}/email`.
///
/// A known path called with the wrong method gets the same 404 as an unknown path.
pub fn router<E: EmailService>() -> Router<AppState<E>> {
    Router::new()
        .route("/send", post(send_email::handler::<E>).fallback(not_found))
        .route("/test", get(test_connection::handler::<E>).fallback(not_found))
        .route("/health", get(health::handler::<E>).fallback(not_found))
}
