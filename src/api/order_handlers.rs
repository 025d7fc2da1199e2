//! Order & Payment Handlers
//!
//! Checkout, order queries, cancellation, fulfillment, and the payment
//! gateway callback. The callback route is public but signature-verified;
//! everything else requires authentication and is owner-scoped.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::order::{Order, OrderStatus},
    models::requests::{PaymentCallbackRequest, PaymentStatusResponse},
    utils::error::AppResult,
};

use super::handlers::{handle_validation_error, AppState, SuccessResponse};
use super::middleware::AuthUser;

/// Convert the caller's cart into an order awaiting payment
pub async fn checkout(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<Order>>> {
    let order = state.order_service.checkout(user.user_id).await?;
    Ok(Json(SuccessResponse::new(order)))
}

/// List the caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<Vec<Order>>>> {
    let orders = state.order_service.list_orders(user.user_id).await?;
    Ok(Json(SuccessResponse::new(orders)))
}

/// Fetch one of the caller's orders
pub async fn get_order(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Order>>> {
    let order = state
        .order_service
        .get_order(user.user_id, order_id)
        .await?;
    Ok(Json(SuccessResponse::new(order)))
}

/// Cancel an order that has not been paid
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Order>>> {
    let order = state
        .order_service
        .cancel_order(user.user_id, order_id)
        .await?;
    Ok(Json(SuccessResponse::new(order)))
}

/// Payment status of one of the caller's orders
pub async fn payment_status(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<PaymentStatusResponse>>> {
    let order = state
        .order_service
        .get_order(user.user_id, order_id)
        .await?;
    Ok(Json(SuccessResponse::new(PaymentStatusResponse {
        order_id: order.id,
        paid: matches!(order.status, OrderStatus::Paid | OrderStatus::Fulfilled),
        status: order.status,
        transaction_ref: order.transaction_ref,
    })))
}

/// Signed payment-gateway callback; idempotent under redelivery
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(request): Json<PaymentCallbackRequest>,
) -> AppResult<Json<SuccessResponse<Order>>> {
    request.validate().map_err(handle_validation_error)?;

    let order = state.order_service.handle_callback(&request).await?;
    Ok(Json(SuccessResponse::new(order)))
}

/// Mark a paid order as fulfilled
pub async fn fulfill_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Order>>> {
    let order = state.order_service.fulfill_order(order_id).await?;
    Ok(Json(SuccessResponse::new(order)))
}
