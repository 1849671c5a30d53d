//! Merchandise catalog and delivery ledger endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::merchandise::{
        CreateMerchandise, DeliverRequest, Delivery, DeliveryReceipt, DeliveryStatus,
        MerchandiseItem, Restock, UpdateMerchandise,
    },
};

use super::AuthenticatedOperator;

/// List merchandise items
#[utoipa::path(
    get,
    path = "/merchandise",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Items with current stock", body = Vec<MerchandiseItem>)
    )
)]
pub async fn list_merchandise(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
) -> AppResult<Json<Vec<MerchandiseItem>>> {
    Ok(Json(state.services.merchandise.list().await?))
}

/// Items at or below their alert threshold
#[utoipa::path(
    get,
    path = "/merchandise/low-stock",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Low-stock items, emptiest first", body = Vec<MerchandiseItem>)
    )
)]
pub async fn low_stock(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
) -> AppResult<Json<Vec<MerchandiseItem>>> {
    Ok(Json(state.services.reports.low_stock().await?))
}

#[utoipa::path(
    get,
    path = "/merchandise/{id}",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = MerchandiseItem)
    )
)]
pub async fn get_merchandise(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MerchandiseItem>> {
    Ok(Json(state.services.merchandise.get_by_id(id).await?))
}

#[utoipa::path(
    post,
    path = "/merchandise",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    request_body = CreateMerchandise,
    responses(
        (status = 201, description = "Item created", body = MerchandiseItem)
    )
)]
pub async fn create_merchandise(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Json(data): Json<CreateMerchandise>,
) -> AppResult<(StatusCode, Json<MerchandiseItem>)> {
    operator.require_admin()?;
    let item = state.services.merchandise.create(&data).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/merchandise/{id}",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateMerchandise,
    responses(
        (status = 200, description = "Item updated", body = MerchandiseItem)
    )
)]
pub async fn update_merchandise(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateMerchandise>,
) -> AppResult<Json<MerchandiseItem>> {
    operator.require_admin()?;
    Ok(Json(state.services.merchandise.update(id, &data).await?))
}

#[utoipa::path(
    delete,
    path = "/merchandise/{id}",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item and its deliveries deleted")
    )
)]
pub async fn delete_merchandise(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    operator.require_admin()?;
    state.services.merchandise.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add units to stock
#[utoipa::path(
    post,
    path = "/merchandise/{id}/restock",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = Restock,
    responses(
        (status = 200, description = "Item after restock", body = MerchandiseItem)
    )
)]
pub async fn restock(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<Restock>,
) -> AppResult<Json<MerchandiseItem>> {
    operator.require_admin()?;
    Ok(Json(state.services.merchandise.restock(id, &data).await?))
}

/// Who received this item
#[utoipa::path(
    get,
    path = "/merchandise/{id}/deliveries",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Deliveries of the item", body = Vec<Delivery>)
    )
)]
pub async fn list_deliveries(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Delivery>>> {
    Ok(Json(state.services.merchandise.deliveries(id).await?))
}

/// Deliver one unit to an enrolled person
#[utoipa::path(
    post,
    path = "/merchandise/{id}/deliveries",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = DeliverRequest,
    responses(
        (status = 201, description = "Delivered", body = DeliveryReceipt),
        (status = 409, description = "Out of stock or already delivered", body = crate::error::ErrorResponse)
    )
)]
pub async fn deliver(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path(id): Path<Uuid>,
    Json(data): Json<DeliverRequest>,
) -> AppResult<(StatusCode, Json<DeliveryReceipt>)> {
    let receipt = state
        .services
        .merchandise
        .deliver(data.person_id, id, &operator)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Check whether a person already received an item
#[utoipa::path(
    get,
    path = "/merchandise/{id}/deliveries/{person_id}",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Item ID"),
        ("person_id" = Uuid, Path, description = "Enrolled person ID")
    ),
    responses(
        (status = 200, description = "Delivery timestamp, null if not delivered", body = DeliveryStatus),
        (status = 404, description = "Item or person not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delivery_status(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(_operator): AuthenticatedOperator,
    Path((id, person_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<DeliveryStatus>> {
    let delivered_at = state.services.merchandise.delivered_at(person_id, id).await?;
    Ok(Json(DeliveryStatus {
        person_id,
        item_id: id,
        delivered_at,
    }))
}

/// Undo a delivery and put the unit back in stock
#[utoipa::path(
    delete,
    path = "/merchandise/{id}/deliveries/{person_id}",
    tag = "merchandise",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Item ID"),
        ("person_id" = Uuid, Path, description = "Enrolled person ID")
    ),
    responses(
        (status = 204, description = "Delivery undone"),
        (status = 404, description = "No such delivery", body = crate::error::ErrorResponse)
    )
)]
pub async fn undo_delivery(
    State(state): State<crate::AppState>,
    AuthenticatedOperator(operator): AuthenticatedOperator,
    Path((id, person_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state
        .services
        .merchandise
        .undo_delivery(person_id, id, &operator)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
