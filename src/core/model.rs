//! Rows the invoice service reads and writes
//!
//! The field names follow the backend tables (`orders`, `bank_accounts`,
//! `shops`) so the same structs travel over the REST backend unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    InvoiceCreated,
    Paid,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order has been accepted by the shop
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, OrderStatus::Pending | OrderStatus::Cancelled)
    }
}

/// Whether bank details are shown to the customer right at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    #[default]
    Instant,
    Manual,
}

/// A heating-oil order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub order_number: String,

    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,

    pub delivery_first_name: String,
    pub delivery_last_name: String,
    #[serde(default)]
    pub delivery_company: Option<String>,
    pub delivery_street: String,
    pub delivery_postcode: String,
    pub delivery_city: String,

    #[serde(default)]
    pub billing_first_name: Option<String>,
    #[serde(default)]
    pub billing_last_name: Option<String>,
    #[serde(default)]
    pub billing_company: Option<String>,
    #[serde(default)]
    pub billing_street: Option<String>,
    #[serde(default)]
    pub billing_postcode: Option<String>,
    #[serde(default)]
    pub billing_city: Option<String>,

    pub product_name: String,
    pub liters: Decimal,
    pub price_per_liter: Decimal,
    pub base_price: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub selected_bank_account_id: Option<Uuid>,
    #[serde(default)]
    pub invoice_pdf_url: Option<String>,
    #[serde(default)]
    pub invoice_generation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invoice_sent: bool,
    #[serde(default)]
    pub invoice_sent_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// A postal address block as printed on the invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBlock {
    pub name: String,
    pub company: Option<String>,
    pub street: String,
    pub postcode_city: String,
}

impl AddressBlock {
    /// Printable lines, company first when present
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        if let Some(company) = &self.company {
            lines.push(company.clone());
        }
        lines.push(self.name.clone());
        lines.push(self.street.clone());
        lines.push(self.postcode_city.clone());
        lines
    }
}

impl Order {
    pub fn delivery_address(&self) -> AddressBlock {
        AddressBlock {
            name: format!("{} {}", self.delivery_first_name, self.delivery_last_name),
            company: self.delivery_company.clone().filter(|c| !c.trim().is_empty()),
            street: self.delivery_street.clone(),
            postcode_city: format!("{} {}", self.delivery_postcode, self.delivery_city),
        }
    }

    /// Billing address, or the delivery address when none was given
    pub fn billing_address(&self) -> AddressBlock {
        let Some(street) = self.billing_street.as_ref().filter(|s| !s.trim().is_empty()) else {
            return self.delivery_address();
        };

        let first = self
            .billing_first_name
            .as_deref()
            .unwrap_or(&self.delivery_first_name);
        let last = self
            .billing_last_name
            .as_deref()
            .unwrap_or(&self.delivery_last_name);

        AddressBlock {
            name: format!("{} {}", first, last),
            company: self.billing_company.clone().filter(|c| !c.trim().is_empty()),
            street: street.clone(),
            postcode_city: format!(
                "{} {}",
                self.billing_postcode.as_deref().unwrap_or_default(),
                self.billing_city.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Whether a separate billing address has to be printed
    pub fn has_billing_address(&self) -> bool {
        self.billing_street
            .as_ref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// Columns of an order written by the workflow operations
///
/// Only the fields that are set are serialized, so a patch sent to the
/// backend touches exactly those columns. `selected_bank_account_id` uses
/// `Some(None)` to clear the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_bank_account_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_generation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_sent_at: Option<DateTime<Utc>>,
}

impl OrderPatch {
    /// Record a freshly stored invoice
    pub fn invoice_recorded(url: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            invoice_pdf_url: Some(url.into()),
            invoice_generation_date: Some(generated_at),
            ..Default::default()
        }
    }

    /// Flag the invoice as emailed
    pub fn invoice_sent(sent_at: DateTime<Utc>) -> Self {
        Self {
            invoice_sent: Some(true),
            invoice_sent_at: Some(sent_at),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy the set fields onto a row
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(selected) = self.selected_bank_account_id {
            order.selected_bank_account_id = selected;
        }
        if let Some(url) = &self.invoice_pdf_url {
            order.invoice_pdf_url = Some(url.clone());
        }
        if let Some(at) = self.invoice_generation_date {
            order.invoice_generation_date = Some(at);
        }
        if let Some(sent) = self.invoice_sent {
            order.invoice_sent = sent;
        }
        if let Some(at) = self.invoice_sent_at {
            order.invoice_sent_at = Some(at);
        }
    }
}

/// A payment routing target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: Uuid,
    #[serde(default)]
    pub shop_id: Option<Uuid>,
    pub account_name: String,
    pub account_holder: String,
    #[serde(default)]
    pub bank_name: Option<String>,
    pub iban: String,
    #[serde(default)]
    pub bic: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_temporary: bool,
    #[serde(default)]
    pub used_for_order_id: Option<Uuid>,
    #[serde(default)]
    pub use_anyname: bool,
    pub created_at: DateTime<Utc>,
}

/// Tenant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub company_name: String,
    pub company_street: String,
    pub company_postcode: String,
    pub company_city: String,
    #[serde(default)]
    pub company_phone: Option<String>,
    #[serde(default)]
    pub company_email: Option<String>,
    #[serde(default)]
    pub company_website: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub bank_account_id: Option<Uuid>,
    #[serde(default)]
    pub checkout_mode: CheckoutMode,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Shop {
    /// One-line sender address printed above the recipient block
    pub fn sender_line(&self) -> String {
        format!(
            "{} · {} · {} {}",
            self.company_name, self.company_street, self.company_postcode, self.company_city
        )
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_true() -> bool {
    true
}

fn default_vat_rate() -> Decimal {
    Decimal::from(19)
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn test_billing_falls_back_to_delivery() {
        let order = fixtures::order(Uuid::new_v4());
        assert!(!order.has_billing_address());
        assert_eq!(order.billing_address(), order.delivery_address());
    }

    #[test]
    fn test_billing_address_when_present() {
        let mut order = fixtures::order(Uuid::new_v4());
        order.billing_street = Some("Marktplatz 1".to_string());
        order.billing_postcode = Some("24937".to_string());
        order.billing_city = Some("Flensburg".to_string());
        order.billing_company = Some("Mustermann KG".to_string());

        let billing = order.billing_address();
        assert!(order.has_billing_address());
        assert_eq!(billing.street, "Marktplatz 1");
        assert_eq!(billing.name, "Erika Mustermann");
        assert_eq!(billing.lines()[0], "Mustermann KG");
    }

    #[test]
    fn test_status_helpers() {
        assert!(!OrderStatus::Pending.is_confirmed());
        assert!(OrderStatus::Confirmed.is_confirmed());
        assert!(OrderStatus::Paid.is_confirmed());
        assert!(!OrderStatus::Cancelled.is_confirmed());
    }

    #[test]
    fn test_bank_account_defaults_from_json() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "account_name": "Haupt",
            "account_holder": "Heizöl Nord GmbH",
            "iban": "DE89370400440532013000",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let account: BankAccount = serde_json::from_value(json).unwrap();
        assert!(account.is_active);
        assert!(!account.is_temporary);
        assert_eq!(account.currency, "EUR");
    }

    #[test]
    fn test_patch_serializes_only_set_columns() {
        let at = Utc::now();
        let json = serde_json::to_value(OrderPatch::invoice_recorded("https://x/a.pdf", at)).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["invoice_generation_date", "invoice_pdf_url"]);

        let clear = OrderPatch {
            selected_bank_account_id: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&clear).unwrap(),
            serde_json::json!({ "selected_bank_account_id": null })
        );
        assert!(OrderPatch::default().is_empty());
        assert!(!clear.is_empty());
    }

    #[test]
    fn test_patch_leaves_other_columns_alone() {
        let mut order = fixtures::order(Uuid::new_v4());
        order.status = OrderStatus::Paid;
        order.selected_bank_account_id = Some(Uuid::new_v4());
        let at = Utc::now();

        OrderPatch::invoice_sent(at).apply_to(&mut order);
        assert!(order.invoice_sent);
        assert_eq!(order.invoice_sent_at, Some(at));
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.selected_bank_account_id.is_some());

        OrderPatch {
            selected_bank_account_id: Some(None),
            ..Default::default()
        }
        .apply_to(&mut order);
        assert!(order.selected_bank_account_id.is_none());
    }

    #[test]
    fn test_status_wire_format() {
        let value = serde_json::to_value(OrderStatus::InvoiceCreated).unwrap();
        assert_eq!(value, "invoice_created");
    }
}
