//! Printable content of an invoice, assembled from the loaded rows
//!
//! Everything here is already formatted text; the PDF renderer only places
//! strings at coordinates.

use crate::core::model::{Order, Shop};
use crate::invoice::bank::ResolvedBankAccount;
use crate::invoice::format::{format_amount, format_date, format_iban, format_quantity};
use crate::invoice::i18n::Language;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// A label with its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressColumn {
    pub heading: String,
    pub lines: Vec<String>,
}

/// One line of the items table: product, quantity, unit price, amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub cells: [String; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentBlock {
    pub heading: String,
    pub fields: Vec<Field>,
    pub terms: String,
}

/// Net and VAT parts of a gross amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatBreakdown {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

impl VatBreakdown {
    /// Split a gross amount at the given VAT percentage
    pub fn from_gross(gross: Decimal, vat_rate_percent: Decimal) -> Self {
        let divisor = Decimal::ONE + vat_rate_percent / Decimal::ONE_HUNDRED;
        let net = if divisor.is_zero() {
            gross
        } else {
            (gross / divisor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        Self {
            net,
            vat: gross - net,
            gross,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub language: Language,
    pub title: String,
    pub company_name: String,
    pub company_lines: Vec<String>,
    pub sender_line: String,
    pub info: Vec<Field>,
    pub addresses: Vec<AddressColumn>,
    pub table_header: [String; 4],
    pub rows: Vec<TableRow>,
    pub summary: Vec<Field>,
    pub payment: Option<PaymentBlock>,
    pub closing: String,
    pub footer_line: String,
}

/// Inputs the document is built from
pub struct DocumentInput<'a> {
    pub order: &'a Order,
    pub shop: &'a Shop,
    pub bank_account: Option<&'a ResolvedBankAccount>,
    pub language: Language,
    pub issued_on: NaiveDate,
    pub payment_term_days: u32,
}

impl InvoiceDocument {
    pub fn build(input: DocumentInput<'_>) -> Self {
        let DocumentInput {
            order,
            shop,
            bank_account,
            language,
            issued_on,
            payment_term_days,
        } = input;
        let t = language.translations();
        let currency = shop.currency.as_str();

        let mut company_lines = vec![
            shop.company_street.clone(),
            format!("{} {}", shop.company_postcode, shop.company_city),
        ];
        company_lines.extend(shop.company_phone.iter().cloned());
        company_lines.extend(shop.company_email.iter().cloned());
        company_lines.extend(shop.company_website.iter().cloned());

        let mut info = vec![
            Field::new(t.invoice_number, order.order_number.clone()),
            Field::new(t.invoice_date, format_date(issued_on)),
            Field::new(t.order_number, order.order_number.clone()),
        ];
        if let Some(date) = order.delivery_date {
            info.push(Field::new(t.delivery_date, format_date(date)));
        }

        let addresses = vec![
            AddressColumn {
                heading: t.billing_address.to_string(),
                lines: order.billing_address().lines(),
            },
            AddressColumn {
                heading: t.delivery_address.to_string(),
                lines: order.delivery_address().lines(),
            },
        ];

        let mut rows = vec![TableRow {
            cells: [
                order.product_name.clone(),
                format_quantity(order.liters),
                format_amount(order.price_per_liter, currency),
                format_amount(order.base_price, currency),
            ],
        }];
        if !order.delivery_fee.is_zero() {
            rows.push(TableRow {
                cells: [
                    t.delivery_fee.to_string(),
                    String::new(),
                    String::new(),
                    format_amount(order.delivery_fee, currency),
                ],
            });
        }

        let vat = VatBreakdown::from_gross(order.total_amount, shop.vat_rate);
        let summary = vec![
            Field::new(t.net_amount, format_amount(vat.net, currency)),
            Field::new(
                &format!("{} {}%", t.vat, shop.vat_rate.normalize()),
                format_amount(vat.vat, currency),
            ),
            Field::new(t.total, format_amount(vat.gross, currency)),
        ];

        let payment = bank_account.map(|resolved| {
            let account = &resolved.account;
            let mut fields = vec![
                Field::new(t.recipient, resolved.recipient_name(shop)),
                Field::new("IBAN", format_iban(&account.iban)),
            ];
            if let Some(bic) = account.bic.as_ref().filter(|b| !b.trim().is_empty()) {
                fields.push(Field::new("BIC", bic.trim().to_uppercase()));
            }
            if let Some(bank) = account.bank_name.as_ref().filter(|b| !b.trim().is_empty()) {
                fields.push(Field::new(t.bank, bank.clone()));
            }
            fields.push(Field::new(t.reference, order.order_number.clone()));

            PaymentBlock {
                heading: t.payment_details.to_string(),
                fields,
                terms: t.payment_terms_for(payment_term_days),
            }
        });

        let mut footer = vec![shop.company_name.clone()];
        if let Some(vat_number) = &shop.vat_number {
            footer.push(format!("{} {}", t.vat_id, vat_number));
        }
        footer.extend(shop.company_email.iter().cloned());

        Self {
            language,
            title: t.invoice.to_string(),
            company_name: shop.company_name.clone(),
            company_lines,
            sender_line: shop.sender_line(),
            info,
            addresses,
            table_header: [
                t.product.to_string(),
                t.quantity.to_string(),
                t.unit_price.to_string(),
                t.amount.to_string(),
            ],
            rows,
            summary,
            payment,
            closing: t.thank_you.to_string(),
            footer_line: footer.join(" · "),
        }
    }
}
