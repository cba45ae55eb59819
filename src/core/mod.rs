//! Core module containing the rows, ports and errors of the service

pub mod error;
pub mod model;
pub mod service;

pub use error::{
    DeliveryError, EntityError, ErrorResponse, InvoiceError, RenderError, StorageError,
    ValidationError,
};
pub use model::{AddressBlock, BankAccount, CheckoutMode, Order, OrderPatch, OrderStatus, Shop};
pub use service::{
    AssetFetcher, BankAccountService, BlobStore, EmailAttachment, EmailMessage, EmailSender,
    OrderService, ShopService,
};
