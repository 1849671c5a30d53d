//! Enrolled-people roster endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enrollee::{
            EnrolledPerson, NewEnrolledPerson, RosterQuery, RosterSearchResponse,
            UpdateEnrolledPerson,
        },
        import_report::{ImportPreview, ImportRequest, ImportResult},
    },
};

use super::AuthenticatedOperator;

/// Search the roster
///
/// `seq` is echoed back so a client typing ahead can drop stale responses.
#[utoipa::path(
    get,
    path = "/roster",
    tag = "roster",
    security(("bearer_auth" = [])),
    params(RosterQuery),
    responses(
        (status = 200, description = "Matching people", body = RosterSearchResponse)
    )
)]
pub async fn search(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Query(query): Query<RosterQuery>,
) -> AppResult<Json<RosterSearchResponse>> {
    Ok(Json(state.services.roster.search(&query).await?))
}

#[utoipa::path(
    get,
    path = "/roster/{id}",
    tag = "roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Enrolled person ID")),
    responses(
        (status = 200, description = "Person with delivery stamps", body = EnrolledPerson)
    )
)]
pub async fn get_person(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EnrolledPerson>> {
    Ok(Json(state.services.roster.get_by_id(id).await?))
}

#[utoipa::path(
    post,
    path = "/roster",
    tag = "roster",
    security(("bearer_auth" = [])),
    request_body = NewEnrolledPerson,
    responses(
        (status = 201, description = "Person enrolled", body = EnrolledPerson),
        (status = 409, description = "Tax ID already enrolled", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_person(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Json(data): Json<NewEnrolledPerson>,
) -> AppResult<(StatusCode, Json<EnrolledPerson>)> {
    operator.require_admin()?;
    let person = state.services.roster.create(data).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

#[utoipa::path(
    put,
    path = "/roster/{id}",
    tag = "roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Enrolled person ID")),
    request_body = UpdateEnrolledPerson,
    responses(
        (status = 200, description = "Person updated", body = EnrolledPerson)
    )
)]
pub async fn update_person(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateEnrolledPerson>,
) -> AppResult<Json<EnrolledPerson>> {
    operator.require_admin()?;
    Ok(Json(state.services.roster.update(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/roster/{id}",
    tag = "roster",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Enrolled person ID")),
    responses(
        (status = 204, description = "Person removed")
    )
)]
pub async fn delete_person(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    operator.require_admin()?;
    state.services.roster.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a CSV or XLSX file and get the import preview
#[utoipa::path(
    post,
    path = "/roster/import/preview",
    tag = "roster",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data", description = "Field `file`: .csv or .xlsx"),
    responses(
        (status = 200, description = "Candidates with duplicate flags", body = ImportPreview),
        (status = 400, description = "Unreadable or unsupported file", body = crate::error::ErrorResponse)
    )
)]
pub async fn preview_import(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    mut multipart: Multipart,
) -> AppResult<Json<ImportPreview>> {
    operator.require_admin()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let preview = state
            .services
            .roster
            .preview_file(file_name.as_deref(), content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(preview));
    }

    Err(AppError::BadRequest("Missing `file` field".to_string()))
}

/// Insert the confirmed import selection
#[utoipa::path(
    post,
    path = "/roster/import",
    tag = "roster",
    security(("bearer_auth" = [])),
    request_body = ImportRequest,
    responses(
        (status = 200, description = "Import result", body = ImportResult)
    )
)]
pub async fn import(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Json(data): Json<ImportRequest>,
) -> AppResult<Json<ImportResult>> {
    operator.require_admin()?;
    Ok(Json(state.services.roster.import(data.records).await?))
}
