pub mod document;
pub mod json_store;

pub use document::{Document, GitSettings, RegisteredRepo};
pub use json_store::JsonDocumentStore;
