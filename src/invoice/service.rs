//! Invoice generation: load, resolve, lay out, render, upload, record
//!
//! Every step is a sequential await inside one request. Any failure aborts
//! the whole operation; an object that was already uploaded is left in
//! place and re-invoking simply regenerates and overwrites it.

use crate::config::InvoiceConfig;
use crate::core::error::{EntityError, InvoiceError, RenderError, StorageError};
use crate::core::model::{Order, OrderPatch, Shop};
use crate::core::service::{AssetFetcher, BankAccountService, BlobStore, OrderService, ShopService};
use crate::invoice::bank::{BankAccountSource, ResolvedBankAccount, resolve_bank_account};
use crate::invoice::document::{DocumentInput, InvoiceDocument};
use crate::invoice::format::format_iban;
use crate::invoice::i18n::Language;
use crate::invoice::layout::compute_layout;
use crate::invoice::pdf::{LogoImage, render_invoice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Body of `POST /invoices/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub order_id: Uuid,
    #[serde(default)]
    pub language: Option<String>,
}

/// The account printed on the invoice
#[derive(Debug, Clone, Serialize)]
pub struct BankAccountSummary {
    pub id: Uuid,
    pub source: BankAccountSource,
    pub recipient: String,
    pub iban: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

impl BankAccountSummary {
    pub fn new(resolved: &ResolvedBankAccount, shop: &Shop) -> Self {
        Self {
            id: resolved.account.id,
            source: resolved.source,
            recipient: resolved.recipient_name(shop).to_string(),
            iban: format_iban(&resolved.account.iban),
            bic: resolved.account.bic.clone(),
            bank_name: resolved.account.bank_name.clone(),
        }
    }
}

/// Response of a successful generation
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedInvoice {
    pub success: bool,
    pub order_id: Uuid,
    pub pdf_url: String,
    pub file_name: String,
    pub language: Language,
    pub generated_at: DateTime<Utc>,
    pub bank_account: Option<BankAccountSummary>,
}

/// Pick the invoice language: request, then shop, then configured default
pub fn resolve_language(
    requested: Option<&str>,
    shop: &Shop,
    default: Language,
) -> Result<Language, InvoiceError> {
    if let Some(code) = requested.filter(|c| !c.trim().is_empty()) {
        return Ok(code.parse()?);
    }

    match shop.language.as_deref().map(str::parse::<Language>) {
        Some(Ok(language)) => Ok(language),
        Some(Err(e)) => {
            tracing::warn!(shop_id = %shop.id, error = %e, "shop language not supported, using default");
            Ok(default)
        }
        None => Ok(default),
    }
}

/// Loads an order and its shop, mapping absence to 404
pub(crate) async fn load_order_and_shop(
    orders: &dyn OrderService,
    shops: &dyn ShopService,
    order_id: Uuid,
) -> Result<(Order, Shop), InvoiceError> {
    let order = orders
        .get(&order_id)
        .await
        .map_err(|e| StorageError::query("load order", e))?
        .ok_or_else(|| EntityError::not_found("order", order_id))?;

    let shop = shops
        .get(&order.shop_id)
        .await
        .map_err(|e| StorageError::query("load shop", e))?
        .ok_or_else(|| EntityError::not_found("shop", order.shop_id))?;

    Ok((order, shop))
}

/// Generates, stores and records invoices
#[derive(Clone)]
pub struct InvoiceService {
    orders: Arc<dyn OrderService>,
    bank_accounts: Arc<dyn BankAccountService>,
    shops: Arc<dyn ShopService>,
    blobs: Arc<dyn BlobStore>,
    assets: Arc<dyn AssetFetcher>,
    config: InvoiceConfig,
}

impl InvoiceService {
    pub fn new(
        orders: Arc<dyn OrderService>,
        bank_accounts: Arc<dyn BankAccountService>,
        shops: Arc<dyn ShopService>,
        blobs: Arc<dyn BlobStore>,
        assets: Arc<dyn AssetFetcher>,
        config: InvoiceConfig,
    ) -> Self {
        Self {
            orders,
            bank_accounts,
            shops,
            blobs,
            assets,
            config,
        }
    }

    pub fn config(&self) -> &InvoiceConfig {
        &self.config
    }

    async fn fetch_logo(&self, shop: &Shop) -> Result<Option<(String, Vec<u8>)>, InvoiceError> {
        let Some(url) = shop.logo_url.as_ref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };

        let bytes = self
            .assets
            .fetch(url)
            .await
            .map_err(|e| RenderError::Logo {
                url: url.clone(),
                message: format!("{:#}", e),
            })?;
        Ok(Some((url.clone(), bytes)))
    }

    /// Generate the invoice PDF for an order and record its URL
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn generate(
        &self,
        request: GenerateInvoiceRequest,
    ) -> Result<GeneratedInvoice, InvoiceError> {
        let (order, shop) =
            load_order_and_shop(self.orders.as_ref(), self.shops.as_ref(), request.order_id)
                .await?;

        let language = resolve_language(
            request.language.as_deref(),
            &shop,
            self.config.default_language,
        )?;

        let bank_account = resolve_bank_account(&order, &shop, self.bank_accounts.as_ref())
            .await
            .map_err(|e| StorageError::query("resolve bank account", e))?;

        let logo = self.fetch_logo(&shop).await?;

        let generated_at = Utc::now();
        let document = InvoiceDocument::build(DocumentInput {
            order: &order,
            shop: &shop,
            bank_account: bank_account.as_ref(),
            language,
            issued_on: generated_at.date_naive(),
            payment_term_days: self.config.payment_term_days,
        });
        let layout = compute_layout(self.config.page, &self.config.sections, document.rows.len());
        if layout.scale < 1.0 {
            tracing::debug!(scale = layout.scale, "content exceeds page, shrinking sections");
        }

        let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, RenderError> {
            let logo = logo
                .map(|(url, bytes)| {
                    LogoImage::decode(&bytes).map_err(|e| RenderError::Logo {
                        url,
                        message: format!("{:#}", e),
                    })
                })
                .transpose()?;
            render_invoice(&document, &layout, logo.as_ref())
                .map_err(|e| RenderError::Pdf(format!("{:#}", e)))
        })
        .await
        .map_err(|e| InvoiceError::Internal(format!("render task failed: {}", e)))??;

        let file_name = language.invoice_file_name(&order.order_number);
        let size = bytes.len();
        let pdf_url = self
            .blobs
            .put(&file_name, bytes, PDF_CONTENT_TYPE)
            .await
            .map_err(|e| StorageError::Upload {
                key: file_name.clone(),
                message: format!("{:#}", e),
            })?;
        tracing::info!(file_name = %file_name, bytes = size, "invoice uploaded");

        let order_id = order.id;
        self.orders
            .patch(&order_id, OrderPatch::invoice_recorded(&pdf_url, generated_at))
            .await
            .map_err(|e| StorageError::query("record invoice on order", e))?;

        Ok(GeneratedInvoice {
            success: true,
            order_id,
            pdf_url,
            file_name,
            language,
            generated_at,
            bank_account: bank_account.map(|resolved| BankAccountSummary::new(&resolved, &shop)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::fixtures;
    use crate::storage::{
        InMemoryBankAccountService, InMemoryBlobStore, InMemoryOrderService, InMemoryShopService,
        StaticAssetFetcher,
    };
    use axum::http::StatusCode;

    struct Harness {
        service: InvoiceService,
        orders: Arc<InMemoryOrderService>,
        accounts: Arc<InMemoryBankAccountService>,
        shops: Arc<InMemoryShopService>,
        blobs: Arc<InMemoryBlobStore>,
        assets: Arc<StaticAssetFetcher>,
    }

    fn harness() -> Harness {
        let orders = Arc::new(InMemoryOrderService::new());
        let accounts = Arc::new(InMemoryBankAccountService::new());
        let shops = Arc::new(InMemoryShopService::new());
        let blobs = Arc::new(InMemoryBlobStore::new("https://files.test/invoices"));
        let assets = Arc::new(StaticAssetFetcher::new());
        let service = InvoiceService::new(
            orders.clone(),
            accounts.clone(),
            shops.clone(),
            blobs.clone(),
            assets.clone(),
            InvoiceConfig::default(),
        );
        Harness {
            service,
            orders,
            accounts,
            shops,
            blobs,
            assets,
        }
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let h = harness();
        let err = h
            .service
            .generate(GenerateInvoiceRequest {
                order_id: Uuid::new_v4(),
                language: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_without_bank_account() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop.clone());
        h.orders.insert(order.clone());

        let invoice = h
            .service
            .generate(GenerateInvoiceRequest {
                order_id: order.id,
                language: None,
            })
            .await
            .unwrap();

        assert!(invoice.success);
        assert!(invoice.bank_account.is_none());
        assert_eq!(invoice.language, Language::De);
        assert_eq!(invoice.file_name, "Rechnung_HN-1001_de.pdf");
        assert_eq!(
            invoice.pdf_url,
            "https://files.test/invoices/Rechnung_HN-1001_de.pdf"
        );

        let stored = h.blobs.fetch(&invoice.pdf_url).await.unwrap().unwrap();
        assert!(stored.starts_with(b"%PDF"));

        let updated = h.orders.get(&order.id).await.unwrap().unwrap();
        assert_eq!(updated.invoice_pdf_url.as_deref(), Some(invoice.pdf_url.as_str()));
        assert!(updated.invoice_generation_date.is_some());
        assert_eq!(updated.status, order.status);
    }

    #[tokio::test]
    async fn test_generate_uses_selected_account_and_language() {
        let h = harness();
        let mut shop = fixtures::shop();
        let default = fixtures::account("Default");
        shop.bank_account_id = Some(default.id);
        let selected = fixtures::account("Selected");
        let mut order = fixtures::order(shop.id);
        order.selected_bank_account_id = Some(selected.id);

        h.shops.insert(shop.clone());
        h.orders.insert(order.clone());
        h.accounts.create(default).await.unwrap();
        h.accounts.create(selected.clone()).await.unwrap();

        let invoice = h
            .service
            .generate(GenerateInvoiceRequest {
                order_id: order.id,
                language: Some("en".to_string()),
            })
            .await
            .unwrap();

        let summary = invoice.bank_account.unwrap();
        assert_eq!(summary.id, selected.id);
        assert_eq!(summary.source, BankAccountSource::Selected);
        assert_eq!(summary.iban, "DE89 3704 0044 0532 0130 00");
        assert_eq!(invoice.file_name, "Invoice_HN-1001_en.pdf");
    }

    #[tokio::test]
    async fn test_unsupported_language_is_rejected() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());

        let err = h
            .service
            .generate(GenerateInvoiceRequest {
                order_id: order.id,
                language: Some("tlh".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_order_untouched() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());
        h.blobs.fail_uploads(true);

        let err = h
            .service
            .generate(GenerateInvoiceRequest {
                order_id: order.id,
                language: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UPLOAD_FAILED");

        let stored = h.orders.get(&order.id).await.unwrap().unwrap();
        assert!(stored.invoice_pdf_url.is_none());
    }

    #[tokio::test]
    async fn test_broken_logo_aborts() {
        let h = harness();
        let mut shop = fixtures::shop();
        shop.logo_url = Some("https://cdn.test/logo.png".to_string());
        let order = fixtures::order(shop.id);
        h.assets.insert("https://cdn.test/logo.png", b"not a png".to_vec());
        h.shops.insert(shop);
        h.orders.insert(order.clone());

        let err = h
            .service
            .generate(GenerateInvoiceRequest {
                order_id: order.id,
                language: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "LOGO_FETCH_FAILED");
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn test_regenerating_overwrites() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());

        let request = GenerateInvoiceRequest {
            order_id: order.id,
            language: None,
        };
        let first = h.service.generate(request.clone()).await.unwrap();
        let second = h.service.generate(request).await.unwrap();

        assert_eq!(first.pdf_url, second.pdf_url);
        assert_eq!(h.blobs.len(), 1);
    }

    /// Applies a status change right after handing out the loaded row
    struct StatusChangeAfterLoad {
        inner: Arc<InMemoryOrderService>,
        status: crate::core::OrderStatus,
    }

    #[async_trait::async_trait]
    impl OrderService for StatusChangeAfterLoad {
        async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Order>> {
            let snapshot = self.inner.get(id).await?;
            let change = OrderPatch {
                status: Some(self.status),
                ..Default::default()
            };
            self.inner.patch(id, change).await?;
            Ok(snapshot)
        }

        async fn patch(&self, id: &Uuid, patch: OrderPatch) -> anyhow::Result<Order> {
            self.inner.patch(id, patch).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_status_change_survives_generation() {
        let h = harness();
        let shop = fixtures::shop();
        let order = fixtures::order(shop.id);
        h.shops.insert(shop);
        h.orders.insert(order.clone());

        let service = InvoiceService::new(
            Arc::new(StatusChangeAfterLoad {
                inner: h.orders.clone(),
                status: crate::core::OrderStatus::Paid,
            }),
            h.accounts.clone(),
            h.shops.clone(),
            h.blobs.clone(),
            h.assets.clone(),
            InvoiceConfig::default(),
        );
        let invoice = service
            .generate(GenerateInvoiceRequest {
                order_id: order.id,
                language: None,
            })
            .await
            .unwrap();

        let stored = h.orders.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::core::OrderStatus::Paid);
        assert_eq!(stored.invoice_pdf_url.as_deref(), Some(invoice.pdf_url.as_str()));
        assert!(stored.invoice_generation_date.is_some());
    }

    #[test]
    fn test_language_fallback_chain() {
        let mut shop = fixtures::shop();
        assert_eq!(
            resolve_language(Some("it"), &shop, Language::En).unwrap(),
            Language::It
        );
        assert_eq!(resolve_language(None, &shop, Language::En).unwrap(), Language::De);

        shop.language = None;
        assert_eq!(resolve_language(None, &shop, Language::En).unwrap(), Language::En);

        shop.language = Some("xx".to_string());
        assert_eq!(resolve_language(Some(" "), &shop, Language::Fr).unwrap(), Language::Fr);
    }
}
