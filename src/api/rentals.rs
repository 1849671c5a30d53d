//! Rental endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        rental::{CreateRental, RentalQuery, RentalView, ReturnRental},
        report::OverdueCount,
    },
};

use super::AuthenticatedOperator;

/// List rentals
#[utoipa::path(
    get,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(RentalQuery),
    responses(
        (status = 200, description = "Rentals with their displayed status", body = Vec<RentalView>)
    )
)]
pub async fn list_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Query(query): Query<RentalQuery>,
) -> AppResult<Json<Vec<RentalView>>> {
    let rentals = state.services.rentals.list(&query, Utc::now()).await?;
    Ok(Json(rentals))
}

/// Count rentals currently overdue
#[utoipa::path(
    get,
    path = "/rentals/overdue-count",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of open rentals past their return date", body = OverdueCount)
    )
)]
pub async fn overdue_count(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
) -> AppResult<Json<OverdueCount>> {
    let now = Utc::now();
    let overdue = state.services.rentals.count_overdue(now).await?;
    Ok(Json(OverdueCount { overdue, as_of: now }))
}

/// Get rental by ID
#[utoipa::path(
    get,
    path = "/rentals/{id}",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Rental details", body = RentalView),
        (status = 404, description = "Rental not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_rental(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RentalView>> {
    let rental = state.services.rentals.get(id, Utc::now()).await?;
    Ok(Json(rental))
}

/// Check equipment out
#[utoipa::path(
    post,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = CreateRental,
    responses(
        (status = 201, description = "Rental created", body = RentalView),
        (status = 409, description = "Equipment already rented out", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_rental(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Json(data): Json<CreateRental>,
) -> AppResult<(StatusCode, Json<RentalView>)> {
    let rental = state
        .services
        .rentals
        .create(data, &operator, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// Record a full or partial return
#[utoipa::path(
    post,
    path = "/rentals/{id}/return",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Rental ID")),
    request_body = ReturnRental,
    responses(
        (status = 200, description = "Rental after the return", body = RentalView),
        (status = 422, description = "Rental is not open", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_rental(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<ReturnRental>,
) -> AppResult<Json<RentalView>> {
    let rental = state
        .services
        .rentals
        .return_rental(id, data, Utc::now())
        .await?;
    Ok(Json(rental))
}
