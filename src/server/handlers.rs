//! HTTP handlers for invoice and order operations

use super::extract::JsonBody;
use super::host::ServiceHost;
use crate::core::error::InvoiceError;
use crate::core::model::{BankAccount, Order};
use crate::email::{SendInvoiceRequest, SentInvoice};
use crate::invoice::{GenerateInvoiceRequest, GeneratedInvoice};
use crate::orders::{PaymentDetails, TemporaryBankAccountRequest, UpdateOrderRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

/// Application state shared across handlers
pub type AppState = Arc<ServiceHost>;

/// POST /invoices/generate
pub async fn generate_invoice(
    State(host): State<AppState>,
    JsonBody(request): JsonBody<GenerateInvoiceRequest>,
) -> Result<Json<GeneratedInvoice>, InvoiceError> {
    let invoice = host.invoices.generate(request).await?;
    Ok(Json(invoice))
}

/// POST /invoices/send
pub async fn send_invoice(
    State(host): State<AppState>,
    JsonBody(request): JsonBody<SendInvoiceRequest>,
) -> Result<Json<SentInvoice>, InvoiceError> {
    let sent = host.mailer.send_invoice(request).await?;
    Ok(Json(sent))
}

/// GET /orders/{id}/payment-details
pub async fn payment_details(
    State(host): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PaymentDetails>, InvoiceError> {
    let details = host.orders.payment_details(order_id).await?;
    Ok(Json(details))
}

/// PATCH /orders/{id}
pub async fn update_order(
    State(host): State<AppState>,
    Path(order_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateOrderRequest>,
) -> Result<Json<Order>, InvoiceError> {
    let order = host.orders.update_workflow(order_id, request).await?;
    Ok(Json(order))
}

/// POST /orders/{id}/temporary-bank-account
pub async fn create_temporary_account(
    State(host): State<AppState>,
    Path(order_id): Path<Uuid>,
    JsonBody(request): JsonBody<TemporaryBankAccountRequest>,
) -> Result<(StatusCode, Json<BankAccount>), InvoiceError> {
    let account = host.orders.create_temporary_account(order_id, request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}
