//! API handlers for Radiodesk REST endpoints

pub mod equipment;
pub mod events;
pub mod health;
pub mod merchandise;
pub mod openapi;
pub mod rentals;
pub mod roster;
pub mod sectors;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post},
    Router,
};

use crate::{
    error::AppError,
    models::operator::{Operator, OperatorClaims},
    AppState,
};

/// Roster spreadsheets can exceed axum's 2 MB default
const UPLOAD_LIMIT: usize = 16 * 1024 * 1024;

/// Extractor for the operator behind the bearer token
pub struct AuthenticatedOperator(pub Operator);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedOperator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Authentication("Invalid authorization header format".to_string())
        })?;

        let auth = &state.config.auth;
        let claims = OperatorClaims::from_token(token, &auth.jwt_secret, auth.audience.as_deref())
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedOperator(claims.into()))
    }
}

/// Versioned API routes, without the outer middleware stack
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Equipment
        .route("/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route(
            "/equipment/:id",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/current", get(events::current_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/summary", get(events::event_summary))
        // Sectors
        .route("/sectors", get(sectors::list_sectors).post(sectors::create_sector))
        .route(
            "/sectors/:id",
            get(sectors::get_sector)
                .put(sectors::update_sector)
                .delete(sectors::delete_sector),
        )
        // Rentals
        .route("/rentals", get(rentals::list_rentals).post(rentals::create_rental))
        .route("/rentals/overdue-count", get(rentals::overdue_count))
        .route("/rentals/:id", get(rentals::get_rental))
        .route("/rentals/:id/return", post(rentals::return_rental))
        // Merchandise
        .route(
            "/merchandise",
            get(merchandise::list_merchandise).post(merchandise::create_merchandise),
        )
        .route("/merchandise/low-stock", get(merchandise::low_stock))
        .route(
            "/merchandise/:id",
            get(merchandise::get_merchandise)
                .put(merchandise::update_merchandise)
                .delete(merchandise::delete_merchandise),
        )
        .route("/merchandise/:id/restock", post(merchandise::restock))
        .route(
            "/merchandise/:id/deliveries",
            get(merchandise::list_deliveries).post(merchandise::deliver),
        )
        .route(
            "/merchandise/:id/deliveries/:person_id",
            get(merchandise::delivery_status).delete(merchandise::undo_delivery),
        )
        // Roster
        .route("/roster", get(roster::search).post(roster::create_person))
        .route(
            "/roster/:id",
            get(roster::get_person)
                .put(roster::update_person)
                .delete(roster::delete_person),
        )
        .route(
            "/roster/import/preview",
            post(roster::preview_import).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/roster/import", post(roster::import))
        .with_state(state)
}
