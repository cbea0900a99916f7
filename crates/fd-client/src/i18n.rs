//! Language selection and string lookup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ClientError, Result};

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Current language plus an in-memory message catalog
#[derive(Debug, Clone)]
pub struct Localization {
    current_language: String,
    languages: Vec<Language>,
    catalog: HashMap<String, HashMap<String, String>>,
}

impl Default for Localization {
    fn default() -> Self {
        Self::new(vec![
            Language::new("en", "English"),
            Language::new("es", "Español"),
            Language::new("fr", "Français"),
        ])
    }
}

impl Localization {
    pub fn new(languages: Vec<Language>) -> Self {
        Self {
            current_language: DEFAULT_LANGUAGE.to_string(),
            languages,
            catalog: HashMap::new(),
        }
    }

    /// Add (or replace) messages for one language
    pub fn with_translations<K, V>(
        mut self,
        code: &str,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let table = self.catalog.entry(code.to_string()).or_default();
        for (key, value) in entries {
            table.insert(key.into(), value.into());
        }
        self
    }

    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn change_language(&mut self, code: &str) -> Result<()> {
        if !self.languages.iter().any(|l| l.code == code) {
            return Err(ClientError::UnknownLanguage(code.to_string()));
        }
        debug!("Language changed to {}", code);
        self.current_language = code.to_string();
        Ok(())
    }

    /// Message for `key` in the current language, else the default
    /// language, else the key itself
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.lookup(&self.current_language, key)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, key))
            .unwrap_or(key)
    }

    fn lookup(&self, code: &str, key: &str) -> Option<&str> {
        self.catalog
            .get(code)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Localization {
        Localization::default()
            .with_translations("en", [("save", "Save"), ("delete", "Delete")])
            .with_translations("es", [("save", "Guardar")])
    }

    #[test]
    fn test_change_language() {
        let mut i18n = catalog();
        assert_eq!(i18n.current_language(), "en");
        i18n.change_language("es").unwrap();
        assert_eq!(i18n.current_language(), "es");

        let err = i18n.change_language("xx").unwrap_err();
        assert!(matches!(err, ClientError::UnknownLanguage(code) if code == "xx"));
        assert_eq!(i18n.current_language(), "es");
    }

    #[test]
    fn test_translate_fallbacks() {
        let mut i18n = catalog();
        i18n.change_language("es").unwrap();

        assert_eq!(i18n.translate("save"), "Guardar");
        assert_eq!(i18n.translate("delete"), "Delete");
        assert_eq!(i18n.translate("missing.key"), "missing.key");
    }
}
