//! Dot-path translation lookup over the embedded locale dictionaries.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::i18n::Language;

const LOCALE_TR: &str = include_str!("../../locales/tr.json");
const LOCALE_EN: &str = include_str!("../../locales/en.json");

/// Resolve a dot-delimited key path (e.g. `"home.hero_title"`) against a
/// nested dictionary.
///
/// Returns `None` when any path segment is missing or the final value is
/// not a string; callers fall back to the literal key so a missing
/// translation is visible on the page instead of rendering blank.
pub fn resolve<'a>(dict: &'a Value, key: &str) -> Option<&'a str> {
    let mut current = dict;
    for segment in key.split('.') {
        current = current.get(segment)?;
    }
    current.as_str()
}

/// The loaded locale dictionaries plus the site's default language.
///
/// Both dictionaries are parsed once at startup and shared read-only;
/// callers pick the language per request.
#[derive(Debug, Clone)]
pub struct Translations {
    dictionaries: HashMap<Language, Value>,
    default: Language,
}

impl Translations {
    pub fn load(default_language: Language) -> Result<Self> {
        let mut dictionaries = HashMap::new();
        dictionaries.insert(
            Language::Turkish,
            serde_json::from_str(LOCALE_TR).context("Failed to parse locales/tr.json")?,
        );
        dictionaries.insert(
            Language::English,
            serde_json::from_str(LOCALE_EN).context("Failed to parse locales/en.json")?,
        );

        Ok(Self {
            dictionaries,
            default: default_language,
        })
    }

    pub fn language(&self) -> Language {
        self.default
    }

    /// Translate a key in a specific language, falling back to the key
    /// itself when no translation exists.
    pub fn translate_in(&self, language: Language, key: &str) -> String {
        self.dictionaries
            .get(&language)
            .and_then(|dict| resolve(dict, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// The whole dictionary for one language, for clients that load the
    /// copy wholesale.
    pub fn dictionary(&self, language: Language) -> &Value {
        // Both variants are inserted in load(); the map is never mutated after.
        &self.dictionaries[&language]
    }
}
