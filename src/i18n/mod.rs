//! Internationalization (i18n) module.
//!
//! The site ships two languages (Turkish and English) with Turkish as the
//! default. Static marketing copy lives in nested locale dictionaries that
//! are embedded into the binary and loaded wholesale at startup; language
//! selection is per request with no network call.
//!
//! - `language`: the fixed, validated set of supported languages
//! - `lookup`: dot-path key resolution against the loaded dictionaries

mod language;
mod lookup;

pub use language::Language;
pub use lookup::{resolve, Translations};
