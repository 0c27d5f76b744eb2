pub mod build;
pub mod extract;
pub mod label;
pub mod sanitize;
