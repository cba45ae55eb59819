//! Storage implementations for different backends

pub mod in_memory;
pub mod rest;

pub use in_memory::{
    InMemoryBankAccountService, InMemoryBlobStore, InMemoryOrderService, InMemoryShopService,
    RecordingEmailSender, StaticAssetFetcher,
};
pub use rest::{HttpAssetFetcher, ObjectStorage, RestBackend};
