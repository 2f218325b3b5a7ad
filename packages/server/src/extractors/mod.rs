pub mod auth;
pub mod entry_form;
pub mod json;
