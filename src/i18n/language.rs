//! The fixed set of languages the site supports.

/// A supported site language.
///
/// The set is closed: content rows and locale dictionaries exist for
/// exactly these languages, and every content entry is expected to carry
/// one value per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Turkish,
    English,
}

impl Language {
    /// All supported languages, in display order (Turkish first; it is
    /// the site's default).
    pub const ALL: [Language; 2] = [Language::Turkish, Language::English];

    /// ISO 639-1 code used in content rows and URLs.
    pub fn code(self) -> &'static str {
        match self {
            Language::Turkish => "tr",
            Language::English => "en",
        }
    }

    pub fn native_name(self) -> &'static str {
        match self {
            Language::Turkish => "Türkçe",
            Language::English => "English",
        }
    }

    /// Parse a language code. Returns `None` for anything outside the
    /// supported set.
    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "tr" => Some(Language::Turkish),
            "en" => Some(Language::English),
            _ => None,
        }
    }

    /// Codes for every supported language, in the same order as [`ALL`].
    ///
    /// [`ALL`]: Language::ALL
    pub fn codes() -> [&'static str; 2] {
        ["tr", "en"]
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Turkish
    }
}
