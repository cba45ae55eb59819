//! Router builder utilities for invoice and order routes

use super::handlers::{
    AppState, create_temporary_account, generate_invoice, payment_details, send_invoice,
    update_order,
};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Build the invoice and order routes
///
/// - POST /invoices/generate - Generate and store the invoice PDF of an order
/// - POST /invoices/send - Email a stored invoice to the customer
/// - GET /orders/{id}/payment-details - Bank details for checkout
/// - PATCH /orders/{id} - Update status or selected bank account
/// - POST /orders/{id}/temporary-bank-account - Create a one-off account
pub fn build_invoice_routes(state: AppState) -> Router {
    Router::new()
        .route("/invoices/generate", post(generate_invoice))
        .route("/invoices/send", post(send_invoice))
        .route("/orders/{id}", patch(update_order))
        .route("/orders/{id}/payment-details", get(payment_details))
        .route(
            "/orders/{id}/temporary-bank-account",
            post(create_temporary_account),
        )
        .with_state(state)
}
