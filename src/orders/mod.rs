//! Order workflow operations around invoicing
//!
//! Orders are mutated through direct field updates: the admin moves the
//! status along, picks a bank account, or creates a one-off temporary
//! account for a single order.

use crate::core::error::{EntityError, InvoiceError, StorageError, ValidationError};
use crate::core::model::{BankAccount, CheckoutMode, Order, OrderPatch, OrderStatus};
use crate::core::service::{BankAccountService, OrderService, ShopService};
use crate::invoice::bank::resolve_bank_account;
use crate::invoice::format::{format_amount, is_valid_iban, normalize_iban};
use crate::invoice::service::{BankAccountSummary, load_order_and_shop};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Body of `PATCH /orders/{id}`
///
/// An absent `selected_bank_account_id` keeps the selection, an explicit
/// `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_bank_account_id: Option<Option<Uuid>>,
}

/// Wraps any present value, `null` included, in `Some`
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `POST /orders/{id}/temporary-bank-account`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemporaryBankAccountRequest {
    #[validate(length(min = 1, max = 200, message = "account holder is required"))]
    pub account_holder: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[validate(length(min = 15, max = 42))]
    pub iban: String,
    #[serde(default)]
    #[validate(length(min = 8, max = 11, message = "BIC must have 8 or 11 characters"))]
    pub bic: Option<String>,
    #[serde(default)]
    pub use_anyname: bool,
}

/// What the checkout page may show for an order
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetails {
    pub order_id: Uuid,
    pub order_number: String,
    pub checkout_mode: CheckoutMode,
    /// False while a manual-checkout order awaits confirmation
    pub available: bool,
    pub amount: String,
    pub reference: String,
    pub bank_account: Option<BankAccountSummary>,
}

/// Order-level workflow operations
#[derive(Clone)]
pub struct OrderWorkflow {
    orders: Arc<dyn OrderService>,
    bank_accounts: Arc<dyn BankAccountService>,
    shops: Arc<dyn ShopService>,
}

impl OrderWorkflow {
    pub fn new(
        orders: Arc<dyn OrderService>,
        bank_accounts: Arc<dyn BankAccountService>,
        shops: Arc<dyn ShopService>,
    ) -> Self {
        Self {
            orders,
            bank_accounts,
            shops,
        }
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Order, InvoiceError> {
        let order = self
            .orders
            .get(&order_id)
            .await
            .map_err(|e| StorageError::query("load order", e))?
            .ok_or_else(|| EntityError::not_found("order", order_id))?;
        Ok(order)
    }

    /// Apply a status change and/or bank account selection
    ///
    /// Only the columns named in the request are written.
    pub async fn update_workflow(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<Order, InvoiceError> {
        let order = self.load_order(order_id).await?;

        if let Some(Some(account_id)) = request.selected_bank_account_id {
            self.bank_accounts
                .get(&account_id)
                .await
                .map_err(|e| StorageError::query("load bank account", e))?
                .ok_or_else(|| EntityError::not_found("bank_account", account_id))?;
        }
        if let Some(status) = request.status {
            tracing::info!(%order_id, from = ?order.status, to = ?status, "order status changed");
        }
        if request.selected_bank_account_id == Some(None) {
            tracing::info!(%order_id, "bank account selection cleared");
        }

        let patch = OrderPatch {
            status: request.status,
            selected_bank_account_id: request.selected_bank_account_id,
            ..Default::default()
        };
        if patch.is_empty() {
            return Ok(order);
        }

        let updated = self
            .orders
            .patch(&order_id, patch)
            .await
            .map_err(|e| StorageError::query("update order", e))?;
        Ok(updated)
    }

    /// Create an active temporary account bound to one order
    pub async fn create_temporary_account(
        &self,
        order_id: Uuid,
        request: TemporaryBankAccountRequest,
    ) -> Result<BankAccount, InvoiceError> {
        request.validate()?;
        if !is_valid_iban(&request.iban) {
            return Err(ValidationError::field("iban", "IBAN is malformed").into());
        }

        let (order, shop) =
            load_order_and_shop(self.orders.as_ref(), self.shops.as_ref(), order_id).await?;

        let account = BankAccount {
            id: Uuid::new_v4(),
            shop_id: Some(shop.id),
            account_name: request
                .account_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("{} {}", request.account_holder, order.order_number)),
            account_holder: request.account_holder,
            bank_name: request.bank_name,
            iban: normalize_iban(&request.iban),
            bic: request.bic.map(|b| b.trim().to_ascii_uppercase()),
            currency: shop.currency.clone(),
            is_active: true,
            is_temporary: true,
            used_for_order_id: Some(order.id),
            use_anyname: request.use_anyname,
            created_at: Utc::now(),
        };

        let created = self
            .bank_accounts
            .create(account)
            .await
            .map_err(|e| StorageError::query("create bank account", e))?;
        tracing::info!(%order_id, account_id = %created.id, "temporary bank account created");
        Ok(created)
    }

    /// Bank details to show for an order at checkout
    pub async fn payment_details(&self, order_id: Uuid) -> Result<PaymentDetails, InvoiceError> {
        let (order, shop) =
            load_order_and_shop(self.orders.as_ref(), self.shops.as_ref(), order_id).await?;

        let available = match shop.checkout_mode {
            CheckoutMode::Instant => true,
            CheckoutMode::Manual => order.status.is_confirmed(),
        };

        let bank_account = if available {
            resolve_bank_account(&order, &shop, self.bank_accounts.as_ref())
                .await
                .map_err(|e| StorageError::query("resolve bank account", e))?
                .map(|resolved| BankAccountSummary::new(&resolved, &shop))
        } else {
            None
        };

        Ok(PaymentDetails {
            order_id: order.id,
            order_number: order.order_number.clone(),
            checkout_mode: shop.checkout_mode,
            available,
            amount: format_amount(order.total_amount, &shop.currency),
            reference: order.order_number,
            bank_account,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::fixtures;
    use crate::invoice::bank::BankAccountSource;
    use crate::storage::{InMemoryBankAccountService, InMemoryOrderService, InMemoryShopService};
    use axum::http::StatusCode;

    struct Harness {
        workflow: OrderWorkflow,
        orders: Arc<InMemoryOrderService>,
        accounts: Arc<InMemoryBankAccountService>,
        shops: Arc<InMemoryShopService>,
    }

    fn harness() -> Harness {
        let orders = Arc::new(InMemoryOrderService::new());
        let accounts = Arc::new(InMemoryBankAccountService::new());
        let shops = Arc::new(InMemoryShopService::new());
        Harness {
            workflow: OrderWorkflow::new(orders.clone(), accounts.clone(), shops.clone()),
            orders,
            accounts,
            shops,
        }
    }

    fn temporary_request() -> TemporaryBankAccountRequest {
        TemporaryBankAccountRequest {
            account_holder: "Max Treuhand".to_string(),
            account_name: None,
            bank_name: Some("Volksbank".to_string()),
            iban: "de44 5001 0517 5407 3249 31".to_string(),
            bic: Some("inGDdeffxxx".to_string()),
            use_anyname: false,
        }
    }

    #[tokio::test]
    async fn test_select_unknown_account_is_not_found() {
        let h = harness();
        let order = fixtures::order(Uuid::new_v4());
        h.orders.insert(order.clone());

        let err = h
            .workflow
            .update_workflow(
                order.id,
                UpdateOrderRequest {
                    selected_bank_account_id: Some(Some(Uuid::new_v4())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_status_and_selection() {
        let h = harness();
        let order = fixtures::order(Uuid::new_v4());
        let account = fixtures::account("A");
        h.orders.insert(order.clone());
        h.accounts.create(account.clone()).await.unwrap();

        let updated = h
            .workflow
            .update_workflow(
                order.id,
                UpdateOrderRequest {
                    status: Some(OrderStatus::InvoiceCreated),
                    selected_bank_account_id: Some(Some(account.id)),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::InvoiceCreated);
        assert_eq!(updated.selected_bank_account_id, Some(account.id));
    }

    #[tokio::test]
    async fn test_null_selection_falls_back_to_shop_default() {
        let h = harness();
        let mut shop = fixtures::shop();
        let default = fixtures::account("Default");
        let chosen = fixtures::account("Chosen");
        shop.bank_account_id = Some(default.id);
        let mut order = fixtures::order(shop.id);
        order.selected_bank_account_id = Some(chosen.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());
        h.accounts.create(default.clone()).await.unwrap();
        h.accounts.create(chosen).await.unwrap();

        let request: UpdateOrderRequest =
            serde_json::from_value(serde_json::json!({ "selected_bank_account_id": null }))
                .unwrap();
        assert_eq!(request.selected_bank_account_id, Some(None));

        let updated = h.workflow.update_workflow(order.id, request).await.unwrap();
        assert!(updated.selected_bank_account_id.is_none());

        let details = h.workflow.payment_details(order.id).await.unwrap();
        let summary = details.bank_account.unwrap();
        assert_eq!(summary.id, default.id);
        assert_eq!(summary.source, BankAccountSource::ShopDefault);
    }

    #[tokio::test]
    async fn test_absent_selection_is_kept() {
        let h = harness();
        let chosen = fixtures::account("Chosen");
        let mut order = fixtures::order(Uuid::new_v4());
        order.selected_bank_account_id = Some(chosen.id);
        h.orders.insert(order.clone());

        let request: UpdateOrderRequest =
            serde_json::from_value(serde_json::json!({ "status": "paid" })).unwrap();
        assert!(request.selected_bank_account_id.is_none());

        let updated = h.workflow.update_workflow(order.id, request).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);
        assert_eq!(updated.selected_bank_account_id, Some(chosen.id));
    }

    #[tokio::test]
    async fn test_temporary_account_is_bound_to_order() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop.clone());
        h.orders.insert(order.clone());

        let created = h
            .workflow
            .create_temporary_account(order.id, temporary_request())
            .await
            .unwrap();

        assert!(created.is_temporary && created.is_active);
        assert_eq!(created.used_for_order_id, Some(order.id));
        assert_eq!(created.iban, "DE44500105175407324931");
        assert_eq!(created.bic.as_deref(), Some("INGDDEFFXXX"));
        assert_eq!(created.account_name, "Max Treuhand HN-1001");

        let details = h.workflow.payment_details(order.id).await.unwrap();
        let summary = details.bank_account.unwrap();
        assert_eq!(summary.source, BankAccountSource::Temporary);
        assert_eq!(summary.iban, "DE44 5001 0517 5407 3249 31");
    }

    #[tokio::test]
    async fn test_malformed_iban_is_rejected() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());

        let mut request = temporary_request();
        request.iban = "DE44-5001-0517-5407".to_string();
        let err = h
            .workflow
            .create_temporary_account(order.id, request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manual_checkout_withholds_details_until_confirmed() {
        let h = harness();
        let mut shop = fixtures::shop();
        shop.checkout_mode = CheckoutMode::Manual;
        let account = fixtures::account("Default");
        shop.bank_account_id = Some(account.id);
        let mut order = fixtures::order(shop.id);
        order.status = OrderStatus::Pending;

        h.shops.insert(shop);
        h.orders.insert(order.clone());
        h.accounts.create(account.clone()).await.unwrap();

        let pending = h.workflow.payment_details(order.id).await.unwrap();
        assert!(!pending.available);
        assert!(pending.bank_account.is_none());
        assert_eq!(pending.amount, "2975.00 €");

        h.workflow
            .update_workflow(
                order.id,
                UpdateOrderRequest {
                    status: Some(OrderStatus::Confirmed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let confirmed = h.workflow.payment_details(order.id).await.unwrap();
        assert!(confirmed.available);
        assert_eq!(confirmed.bank_account.unwrap().id, account.id);
    }
}
