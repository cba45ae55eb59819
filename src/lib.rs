//! # Invoicer
//!
//! Invoice service for a multi-tenant heating-oil shop back-office.
//!
//! ## Features
//!
//! - **Bank Account Resolution**: selected, temporary or shop default account
//! - **One-Page Layout**: sections shrink uniformly instead of paginating
//! - **PDF Assembly**: single A4 page with logo, addresses, line items and payment block
//! - **Blob Storage**: the PDF is uploaded and its URL written back onto the order
//! - **Email Delivery**: the stored invoice is sent to the customer as an attachment
//! - **Localized**: invoices in German, English, French, Italian, Spanish, Polish and Dutch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use invoicer::prelude::*;
//!
//! let app = ServerBuilder::new()
//!     .with_config(ServiceConfig::from_yaml_file("invoicer.yaml")?)
//!     .with_in_memory_defaults()
//!     .build()?;
//!
//! // POST /invoices/generate {"order_id": "..."}
//! ```

pub mod config;
pub mod core;
pub mod email;
pub mod invoice;
pub mod orders;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{EntityError, ErrorResponse, InvoiceError, StorageError, ValidationError},
        model::{BankAccount, CheckoutMode, Order, OrderPatch, OrderStatus, Shop},
        service::{AssetFetcher, BankAccountService, BlobStore, EmailSender, OrderService, ShopService},
    };

    // === Invoice ===
    pub use crate::invoice::{
        BankAccountSource, GenerateInvoiceRequest, GeneratedInvoice, InvoiceService, Language,
        PageGeometry, SectionHeights, compute_layout, resolve_bank_account,
    };

    // === Email & Orders ===
    pub use crate::email::{HttpEmailSender, InvoiceMailer, SendInvoiceRequest};
    pub use crate::orders::{OrderWorkflow, TemporaryBankAccountRequest, UpdateOrderRequest};

    // === Storage ===
    pub use crate::storage::{
        HttpAssetFetcher, InMemoryBankAccountService, InMemoryBlobStore, InMemoryOrderService,
        InMemoryShopService, ObjectStorage, RecordingEmailSender, RestBackend, StaticAssetFetcher,
    };

    // === Config ===
    pub use crate::config::{BackendConfig, EmailConfig, InvoiceConfig, ServiceConfig};

    // === Server ===
    pub use crate::server::{RestExposure, ServerBuilder, ServiceHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
