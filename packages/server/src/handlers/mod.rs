pub mod attachment_type;
pub mod auth;
pub mod content;
pub mod content_type;
pub mod files;
pub mod library;
