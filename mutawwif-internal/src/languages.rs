//! Fixed table of the languages the assistant can answer in.
//!
//! The table exists purely to decorate responses and to tell the downstream
//! generation step which natural language to answer in. Unknown codes resolve
//! to the English label instead of failing.

use serde::Serialize;

/// The 25 supported language codes and their display names, in listing order.
pub const LANGUAGE_TABLE: [(&str, &str); 25] = [
    ("id", "Indonesia"),
    ("en", "English"),
    ("ms", "Melayu"),
    ("sg", "SG English"),
    ("ar", "العربية"),
    ("tr", "Türkçe"),
    ("fr", "Français"),
    ("es", "Español"),
    ("pt", "Português"),
    ("br", "Português BR"),
    ("de", "Deutsch"),
    ("ru", "Русский"),
    ("hi", "हिन्दी"),
    ("bn", "বাংলা"),
    ("ur", "اردو"),
    ("cn", "简体中文"),
    ("tw", "繁體中文"),
    ("ja", "日本語"),
    ("kr", "한국어"),
    ("th", "ไทย"),
    ("vi", "Tiếng Việt"),
    ("ph", "Filipino"),
    ("sw", "Kiswahili"),
    ("it", "Italiano"),
    ("nl", "Nederlands"),
];

const DEFAULT_LANGUAGE_NAME: &str = "English";

/// Resolve a short language code to its display name.
///
/// Codes not in the table fall back to the English label.
pub fn language_name(code: &str) -> &'static str {
    LANGUAGE_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_LANGUAGE_NAME)
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageEntry {
    pub code: &'static str,
    pub name: &'static str,
}

/// All supported languages as `{code, name}` pairs, in table order.
pub fn all_languages() -> Vec<LanguageEntry> {
    LANGUAGE_TABLE
        .iter()
        .map(|&(code, name)| LanguageEntry { code, name })
        .collect()
}

pub fn language_count() -> usize {
    LANGUAGE_TABLE.len()
}
