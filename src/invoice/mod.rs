//! Invoice generation for a single order
//!
//! - [`bank`]: which bank account the invoice shows
//! - [`layout`]: one-page layout with uniform shrinking
//! - [`document`], [`format`], [`i18n`]: the printable text
//! - [`pdf`]: byte assembly
//! - [`service`]: the request flow tying them to storage

pub mod bank;
pub mod document;
pub mod format;
pub mod i18n;
pub mod layout;
pub mod pdf;
pub mod service;

pub use bank::{BankAccountSource, ResolvedBankAccount, resolve_bank_account, resolve_from};
pub use document::InvoiceDocument;
pub use i18n::Language;
pub use layout::{PageGeometry, PageLayout, SectionHeights, compute_layout, fit_logo};
pub use service::{GenerateInvoiceRequest, GeneratedInvoice, InvoiceService};
