//! Sending a generated invoice to the customer
//!
//! The stored PDF is downloaded again, attached as base64 and sent through
//! the [`EmailSender`] port. The order is only marked as sent after the
//! email API accepted the message.

pub mod http;

use crate::config::EmailConfig;
use crate::core::error::{DeliveryError, EntityError, InvoiceError, RenderError, StorageError};
use crate::core::model::{Order, OrderPatch, Shop};
use crate::core::service::{BlobStore, EmailAttachment, EmailMessage, EmailSender, OrderService, ShopService};
use crate::invoice::format::format_amount;
use crate::invoice::i18n::Language;
use crate::invoice::service::{load_order_and_shop, resolve_language};
use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::{Context, Tera};
use uuid::Uuid;
use validator::Validate;

pub use http::HttpEmailSender;

const SUBJECT_TEMPLATE: &str = "invoice_subject.txt";
const BODY_TEMPLATE: &str = "invoice_body.html";

const SUBJECT: &str = "{{ invoice }} {{ order_number }} - {{ company_name }}";

const BODY: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<body style="font-family: Helvetica, Arial, sans-serif; color: #222;">
  <p>{{ greeting }} {{ customer_name }},</p>
  <p>{{ body }} {{ order_number }}.</p>
  <p><strong>{{ total_label }}: {{ total }}</strong></p>
  <p>{{ closing }}<br>{{ company_name }}</p>
{% if company_email %}  <p style="font-size: 12px; color: #777;">{{ company_email }}</p>
{% endif %}</body>
</html>
"#;

/// Body of `POST /invoices/send`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendInvoiceRequest {
    pub order_id: Uuid,
    #[serde(default)]
    pub language: Option<String>,
    /// Overrides the order's customer email
    #[serde(default)]
    #[validate(email(message = "recipient must be a valid email address"))]
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentInvoice {
    pub success: bool,
    pub order_id: Uuid,
    pub message_id: String,
    pub recipient: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct EmailContext<'a> {
    lang: &'static str,
    invoice: &'static str,
    greeting: &'static str,
    body: &'static str,
    closing: &'static str,
    total_label: &'static str,
    customer_name: String,
    order_number: &'a str,
    total: String,
    company_name: &'a str,
    company_email: Option<&'a str>,
}

impl<'a> EmailContext<'a> {
    fn new(order: &'a Order, shop: &'a Shop, language: Language) -> Self {
        let t = language.translations();
        Self {
            lang: language.code(),
            invoice: t.invoice,
            greeting: t.email_greeting,
            body: t.email_body,
            closing: t.email_closing,
            total_label: t.total,
            customer_name: order.billing_address().name,
            order_number: &order.order_number,
            total: format_amount(order.total_amount, &shop.currency),
            company_name: &shop.company_name,
            company_email: shop.company_email.as_deref(),
        }
    }
}

/// Last path segment of the stored PDF URL
fn attachment_name(pdf_url: &str) -> Option<&str> {
    let path = pdf_url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Emails stored invoices to customers
#[derive(Clone)]
pub struct InvoiceMailer {
    orders: Arc<dyn OrderService>,
    shops: Arc<dyn ShopService>,
    blobs: Arc<dyn BlobStore>,
    sender: Arc<dyn EmailSender>,
    config: EmailConfig,
    default_language: Language,
    templates: Arc<Tera>,
}

impl InvoiceMailer {
    pub fn new(
        orders: Arc<dyn OrderService>,
        shops: Arc<dyn ShopService>,
        blobs: Arc<dyn BlobStore>,
        sender: Arc<dyn EmailSender>,
        config: EmailConfig,
        default_language: Language,
    ) -> Result<Self> {
        let mut templates = Tera::default();
        templates.add_raw_templates(vec![(SUBJECT_TEMPLATE, SUBJECT), (BODY_TEMPLATE, BODY)])?;

        Ok(Self {
            orders,
            shops,
            blobs,
            sender,
            config,
            default_language,
            templates: Arc::new(templates),
        })
    }

    fn render(&self, order: &Order, shop: &Shop, language: Language) -> Result<(String, String), RenderError> {
        let context = Context::from_serialize(EmailContext::new(order, shop, language))
            .map_err(|e| RenderError::Template(e.to_string()))?;
        let subject = self
            .templates
            .render(SUBJECT_TEMPLATE, &context)
            .map_err(|e| RenderError::Template(e.to_string()))?;
        let html = self
            .templates
            .render(BODY_TEMPLATE, &context)
            .map_err(|e| RenderError::Template(e.to_string()))?;
        Ok((subject, html))
    }

    /// Send the stored invoice of an order and mark the order as sent
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn send_invoice(&self, request: SendInvoiceRequest) -> Result<SentInvoice, InvoiceError> {
        request.validate()?;

        let (order, shop) =
            load_order_and_shop(self.orders.as_ref(), self.shops.as_ref(), request.order_id)
                .await?;

        let pdf_url = order
            .invoice_pdf_url
            .clone()
            .ok_or(EntityError::InvoiceNotGenerated { order_id: order.id })?;

        let language = resolve_language(request.language.as_deref(), &shop, self.default_language)?;

        let bytes = self
            .blobs
            .fetch(&pdf_url)
            .await
            .map_err(|e| StorageError::Download {
                url: pdf_url.clone(),
                message: format!("{:#}", e),
            })?
            .ok_or_else(|| StorageError::Download {
                url: pdf_url.clone(),
                message: "object not found".to_string(),
            })?;

        let filename = attachment_name(&pdf_url)
            .map(str::to_string)
            .unwrap_or_else(|| language.invoice_file_name(&order.order_number));
        let (subject, html) = self.render(&order, &shop, language)?;

        let recipient = request
            .recipient
            .clone()
            .unwrap_or_else(|| order.customer_email.clone());

        let message = EmailMessage {
            from: self.config.sender(),
            to: vec![recipient.clone()],
            reply_to: shop.company_email.clone(),
            subject,
            html,
            attachments: vec![EmailAttachment {
                filename,
                content: STANDARD.encode(&bytes),
            }],
        };

        let message_id = self
            .sender
            .send(message)
            .await
            .map_err(|e| DeliveryError {
                recipient: recipient.clone(),
                message: format!("{:#}", e),
            })?;
        tracing::info!(message_id = %message_id, "invoice email sent");

        let sent_at = Utc::now();
        let order_id = order.id;
        self.orders
            .patch(&order_id, OrderPatch::invoice_sent(sent_at))
            .await
            .map_err(|e| StorageError::query("mark invoice as sent", e))?;

        Ok(SentInvoice {
            success: true,
            order_id,
            message_id,
            recipient,
            sent_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::fixtures;
    use crate::storage::{InMemoryBlobStore, InMemoryOrderService, InMemoryShopService, RecordingEmailSender};
    use axum::http::StatusCode;

    struct Harness {
        mailer: InvoiceMailer,
        orders: Arc<InMemoryOrderService>,
        shops: Arc<InMemoryShopService>,
        blobs: Arc<InMemoryBlobStore>,
        sender: Arc<RecordingEmailSender>,
    }

    fn harness() -> Harness {
        let orders = Arc::new(InMemoryOrderService::new());
        let shops = Arc::new(InMemoryShopService::new());
        let blobs = Arc::new(InMemoryBlobStore::new("https://files.test/invoices"));
        let sender = Arc::new(RecordingEmailSender::new());
        let mailer = InvoiceMailer::new(
            orders.clone(),
            shops.clone(),
            blobs.clone(),
            sender.clone(),
            EmailConfig::default(),
            Language::De,
        )
        .unwrap();
        Harness {
            mailer,
            orders,
            shops,
            blobs,
            sender,
        }
    }

    async fn seed_with_invoice(h: &Harness) -> Order {
        let mut shop = fixtures::shop();
        shop.company_email = Some("info@heizoel-nord.test".to_string());
        let mut order = fixtures::order(shop.id);
        let url = h
            .blobs
            .put("Rechnung_HN-1001_de.pdf", b"%PDF-1.5 test".to_vec(), "application/pdf")
            .await
            .unwrap();
        order.invoice_pdf_url = Some(url);
        h.shops.insert(shop);
        h.orders.insert(order.clone());
        order
    }

    #[tokio::test]
    async fn test_send_invoice_marks_order() {
        let h = harness();
        let order = seed_with_invoice(&h).await;

        let sent = h
            .mailer
            .send_invoice(SendInvoiceRequest {
                order_id: order.id,
                language: None,
                recipient: None,
            })
            .await
            .unwrap();

        assert_eq!(sent.recipient, order.customer_email);
        let messages = h.sender.sent();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.subject, "Rechnung HN-1001 - Heizöl Nord GmbH");
        assert!(message.html.contains("Guten Tag Erika Mustermann"));
        assert!(message.html.contains("2975.00 €"));
        assert_eq!(message.reply_to.as_deref(), Some("info@heizoel-nord.test"));
        assert_eq!(message.attachments[0].filename, "Rechnung_HN-1001_de.pdf");
        assert_eq!(
            STANDARD.decode(&message.attachments[0].content).unwrap(),
            b"%PDF-1.5 test"
        );

        let stored = h.orders.get(&order.id).await.unwrap().unwrap();
        assert!(stored.invoice_sent);
        assert!(stored.invoice_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_recipient_override_and_language() {
        let h = harness();
        let order = seed_with_invoice(&h).await;

        h.mailer
            .send_invoice(SendInvoiceRequest {
                order_id: order.id,
                language: Some("en".to_string()),
                recipient: Some("buchhaltung@example.com".to_string()),
            })
            .await
            .unwrap();

        let message = &h.sender.sent()[0];
        assert_eq!(message.to, vec!["buchhaltung@example.com".to_string()]);
        assert!(message.subject.starts_with("Invoice HN-1001"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let h = harness();
        let order = seed_with_invoice(&h).await;

        let err = h
            .mailer
            .send_invoice(SendInvoiceRequest {
                order_id: order.id,
                language: None,
                recipient: Some("not-an-email".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(h.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_order_without_invoice_is_conflict() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());

        let err = h
            .mailer
            .send_invoice(SendInvoiceRequest {
                order_id: order.id,
                language: None,
                recipient: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "INVOICE_NOT_GENERATED");
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_order_unsent() {
        let h = harness();
        let order = seed_with_invoice(&h).await;
        h.sender.fail_sends(true);

        let err = h
            .mailer
            .send_invoice(SendInvoiceRequest {
                order_id: order.id,
                language: None,
                recipient: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let stored = h.orders.get(&order.id).await.unwrap().unwrap();
        assert!(!stored.invoice_sent);
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(
            attachment_name("https://x.test/public/invoices/Rechnung_1_de.pdf?t=1"),
            Some("Rechnung_1_de.pdf")
        );
        assert_eq!(attachment_name("https://x.test/"), None);
    }
}
