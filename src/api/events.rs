//! Events API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        event::{CreateEvent, Event, UpdateEvent},
        report::EventSummary,
    },
};

use super::AuthenticatedOperator;

/// List events
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events", body = Vec<Event>)
    )
)]
pub async fn list_events(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
) -> AppResult<Json<Vec<Event>>> {
    let events = state.services.catalog.list_events().await?;
    Ok(Json(events))
}

/// Most recent active event
#[utoipa::path(
    get,
    path = "/events/current",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current event", body = Event),
        (status = 404, description = "No active event", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_event(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
) -> AppResult<Json<Event>> {
    let event = state.services.catalog.current_event().await?;
    Ok(Json(event))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event = state.services.catalog.get_event(id).await?;
    Ok(Json(event))
}

/// Create event
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = Event)
    )
)]
pub async fn create_event(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Json(data): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    operator.require_admin()?;
    let event = state.services.catalog.create_event(&data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Update event
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEvent,
    responses(
        (status = 200, description = "Event updated", body = Event)
    )
)]
pub async fn update_event(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateEvent>,
) -> AppResult<Json<Event>> {
    operator.require_admin()?;
    let event = state.services.catalog.update_event(id, &data).await?;
    Ok(Json(event))
}

/// Delete event
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted")
    )
)]
pub async fn delete_event(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    operator.require_admin()?;
    state.services.catalog.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rental counts per sector for an event
#[utoipa::path(
    get,
    path = "/events/{id}/summary",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Per-sector summary", body = EventSummary)
    )
)]
pub async fn event_summary(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventSummary>> {
    let summary = state.services.reports.event_summary(id, Utc::now()).await?;
    Ok(Json(summary))
}
