pub mod attachment;
pub mod attachment_type;
pub mod content;
pub mod content_feature;
pub mod content_type;
pub mod content_type_attachment_type;
pub mod content_type_feature;
pub mod library;
pub mod user;
