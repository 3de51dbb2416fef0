pub mod admin;
pub mod chat;
pub mod fallback;
pub mod guide;
pub mod status;
pub mod translate;
