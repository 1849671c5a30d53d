//! Sector API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::sector::{CreateSector, Sector, UpdateSector},
};

use super::AuthenticatedOperator;

#[utoipa::path(
    get,
    path = "/sectors",
    tag = "sectors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sectors", body = Vec<Sector>)
    )
)]
pub async fn list_sectors(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
) -> AppResult<Json<Vec<Sector>>> {
    Ok(Json(state.services.catalog.list_sectors().await?))
}

#[utoipa::path(
    get,
    path = "/sectors/{id}",
    tag = "sectors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Sector ID")),
    responses(
        (status = 200, description = "Sector details", body = Sector)
    )
)]
pub async fn get_sector(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Sector>> {
    Ok(Json(state.services.catalog.get_sector(id).await?))
}

#[utoipa::path(
    post,
    path = "/sectors",
    tag = "sectors",
    security(("bearer_auth" = [])),
    request_body = CreateSector,
    responses(
        (status = 201, description = "Sector created", body = Sector)
    )
)]
pub async fn create_sector(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Json(data): Json<CreateSector>,
) -> AppResult<(StatusCode, Json<Sector>)> {
    operator.require_admin()?;
    let sector = state.services.catalog.create_sector(&data).await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

#[utoipa::path(
    put,
    path = "/sectors/{id}",
    tag = "sectors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Sector ID")),
    request_body = UpdateSector,
    responses(
        (status = 200, description = "Sector updated", body = Sector)
    )
)]
pub async fn update_sector(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateSector>,
) -> AppResult<Json<Sector>> {
    operator.require_admin()?;
    Ok(Json(state.services.catalog.update_sector(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/sectors/{id}",
    tag = "sectors",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Sector ID")),
    responses(
        (status = 204, description = "Sector deleted")
    )
)]
pub async fn delete_sector(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    operator.require_admin()?;
    state.services.catalog.delete_sector(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
