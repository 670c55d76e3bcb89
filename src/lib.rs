//! Bilingual law-firm site backend: public content/translation API plus an
//! authenticated content-management surface, backed by a hosted store.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod i18n;
pub mod intake;
pub mod security;
pub mod server;
pub mod store;
