//! Internationalization (i18n) support
//!
//! UI strings ship for `pt-BR` and `en`. A `languages/<lang>.yml` file next
//! to the site configuration overrides individual keys.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PT_BR: &[(&str, &str)] = &[
    ("home", "Home"),
    ("load_more", "Carregar mais posts"),
    ("loading", "Carregando..."),
    ("minutes", "min"),
    ("not_found", "Post não encontrado"),
    ("not_found_hint", "Voltar para a página inicial"),
    ("error", "Não foi possível carregar este post"),
    ("error_hint", "Tente novamente em instantes"),
];

const EN: &[(&str, &str)] = &[
    ("home", "Home"),
    ("load_more", "Load more posts"),
    ("loading", "Loading..."),
    ("minutes", "min"),
    ("not_found", "Post not found"),
    ("not_found_hint", "Back to the home page"),
    ("error", "This post could not be loaded"),
    ("error_hint", "Please try again in a moment"),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in translations
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        translations.insert("pt-BR".to_string(), to_map(PT_BR));
        translations.insert("en".to_string(), to_map(EN));

        Self {
            language: normalize(language),
            translations,
        }
    }

    /// Load language overrides from a directory of `<lang>.yml` files
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(normalize)
                .unwrap_or_else(|| "en".to_string());
            let content = fs::read_to_string(&path)?;
            let data: HashMap<String, String> = serde_yaml::from_str(&content)
                .with_context(|| format!("invalid language file {:?}", path))?;

            self.translations.entry(lang).or_default().extend(data);
            tracing::debug!("Loaded language file: {:?}", path);
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key, falling back to English, then to the key
    pub fn get(&self, key: &str) -> String {
        [self.language.as_str(), "en"]
            .iter()
            .filter_map(|lang| self.translations.get(*lang))
            .find_map(|data| data.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// All keys of the current language, with English fallbacks
    pub fn strings(&self) -> Strings {
        let mut all = self.translations.get("en").cloned().unwrap_or_default();
        if let Some(data) = self.translations.get(&self.language) {
            all.extend(data.clone());
        }
        Strings(all)
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

/// Flattened translations for template contexts
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Strings(HashMap<String, String>);

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `pt_br`, `pt-br` and `pt-BR` all name the same language
fn normalize(language: &str) -> String {
    let language = language.trim().replace('_', "-");
    match language.split_once('-') {
        Some((lang, region)) => format!("{}-{}", lang.to_lowercase(), region.to_uppercase()),
        None => language.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_translations() {
        let i18n = I18n::new("pt_br");
        assert_eq!(i18n.language(), "pt-BR");
        assert_eq!(i18n.get("load_more"), "Carregar mais posts");
        assert_eq!(i18n.get("unknown"), "unknown");

        let i18n = I18n::new("en");
        assert_eq!(i18n.get("loading"), "Loading...");

        // unknown language falls back to English
        let i18n = I18n::new("fr");
        assert_eq!(i18n.get("load_more"), "Load more posts");
    }

    #[test]
    fn test_load_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt-BR.yml"),
            "load_more: Mais posts\nfooter: Rodapé\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut i18n = I18n::new("pt-BR");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("load_more"), "Mais posts");
        assert_eq!(i18n.get("loading"), "Carregando...");

        let strings = serde_json::to_value(i18n.strings()).unwrap();
        assert_eq!(strings["footer"], "Rodapé");
        assert_eq!(strings["minutes"], "min");
    }
}
