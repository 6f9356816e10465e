pub mod account;
pub mod catalog;
pub mod library;
pub mod registry;

pub use account::AccountService;
pub use catalog::ContentCatalog;
pub use library::LibraryIndex;
pub use registry::SchemaRegistry;
