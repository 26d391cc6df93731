//! Static directory of supported synthesis languages.
//!
//! Aliases (full names and short codes) resolve many-to-one onto a
//! canonical code; each canonical code has exactly one display name.

/// A supported language, addressed by its canonical short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Alias applied when a request omits the language entirely.
pub const DEFAULT_ALIAS: &str = "english";

const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "es", name: "Spanish" },
    Language { code: "fr", name: "French" },
    Language { code: "de", name: "German" },
    Language { code: "it", name: "Italian" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "ru", name: "Russian" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "zh", name: "Chinese" },
    Language { code: "ar", name: "Arabic" },
    Language { code: "bn", name: "Bengali" },
    Language { code: "ta", name: "Tamil" },
    Language { code: "te", name: "Telugu" },
    Language { code: "mr", name: "Marathi" },
    Language { code: "gu", name: "Gujarati" },
    Language { code: "ur", name: "Urdu" },
];

/// Resolve a client-supplied alias (full name or short code) to its
/// canonical language. Matching is case-insensitive.
pub fn resolve(alias: &str) -> Option<&'static Language> {
    let alias = alias.trim().to_ascii_lowercase();
    if alias.is_empty() {
        return None;
    }
    LANGUAGES
        .iter()
        .find(|lang| lang.code == alias || lang.name.to_ascii_lowercase() == alias)
}

/// Display name for a canonical code.
pub fn display_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|lang| lang.code == code)
        .map(|lang| lang.name)
}

pub fn all() -> &'static [Language] {
    LANGUAGES
}

/// Every accepted alias, lower-cased, in directory order: for each
/// language the full name first, then the short code.
pub fn aliases() -> impl Iterator<Item = (String, &'static Language)> {
    LANGUAGES
        .iter()
        .flat_map(|lang| [(lang.name.to_ascii_lowercase(), lang), (lang.code.to_string(), lang)])
}
