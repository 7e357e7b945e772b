//! Working-language resolution.
//!
//! An explicit, supported language code from the caller always wins.
//! Otherwise the text is classified by script, and anything outside the
//! supported set (or text that cannot be classified) resolves to English.

use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Languages the pipeline answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ta,
    Te,
}

impl Language {
    pub const SUPPORTED: [Language; 4] = [Language::En, Language::Hi, Language::Ta, Language::Te];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ta => "ta",
            Self::Te => "te",
        }
    }

    /// Name used in the answer instruction
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "Hindi",
            Self::Ta => "Tamil",
            Self::Te => "Telugu",
        }
    }

    /// Parse a language code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Self::En),
            "hi" => Some(Self::Hi),
            "ta" => Some(Self::Ta),
            "te" => Some(Self::Te),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Detects the language of a piece of text.
///
/// May return codes outside [`Language::SUPPORTED`]; the resolver decides
/// what to do with them.
pub trait LanguageDetector: Send + Sync + fmt::Debug {
    fn detect(&self, text: &str) -> AppResult<String>;
}

/// Unicode script ranges and the language code each maps to.
const SCRIPTS: [(&str, u32, u32); 6] = [
    ("hi", 0x0900, 0x097F), // Devanagari
    ("bn", 0x0980, 0x09FF), // Bengali
    ("ta", 0x0B80, 0x0BFF), // Tamil
    ("te", 0x0C00, 0x0C7F), // Telugu
    ("ru", 0x0400, 0x04FF), // Cyrillic
    ("ar", 0x0600, 0x06FF), // Arabic
];

/// Classifies text by its dominant Unicode script.
///
/// Latin letters count as English. Code points inside a script block count
/// toward that script whether or not they are letters, so vowel signs and
/// viramas are included.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptDetector;

impl ScriptDetector {
    fn script_of(c: char) -> Option<&'static str> {
        let code = c as u32;
        if let Some((lang, _, _)) = SCRIPTS
            .iter()
            .find(|(_, start, end)| (*start..=*end).contains(&code))
        {
            return Some(lang);
        }
        if c.is_ascii_alphabetic() || (c.is_alphabetic() && (0x00C0..=0x024F).contains(&code)) {
            return Some("en");
        }
        None
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> AppResult<String> {
        // (code, count) in first-seen order so ties resolve deterministically
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for script in text.chars().filter_map(Self::script_of) {
            match counts.iter_mut().find(|(code, _)| *code == script) {
                Some((_, count)) => *count += 1,
                None => counts.push((script, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (code, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((code, count));
            }
        }

        best.map(|(code, _)| code.to_string())
            .ok_or_else(|| AppError::Other("No recognizable script in text".to_string()))
    }
}

/// Decides the working language of a request.
#[derive(Debug, Clone)]
pub struct LanguageResolver {
    detector: Arc<dyn LanguageDetector>,
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self::new(Arc::new(ScriptDetector))
    }
}

impl LanguageResolver {
    pub fn new(detector: Arc<dyn LanguageDetector>) -> Self {
        Self { detector }
    }

    /// Resolve the working language. Never fails: English is the fallback.
    pub fn resolve(&self, text: &str, requested: Option<&str>) -> Language {
        if let Some(requested) = requested {
            match Language::from_code(requested) {
                Some(language) => return language,
                None => tracing::debug!("Unsupported language '{}', detecting instead", requested),
            }
        }

        match self.detector.detect(text) {
            Ok(code) => Language::from_code(&code).unwrap_or_else(|| {
                tracing::debug!("Detected unsupported language '{}', using en", code);
                Language::En
            }),
            Err(e) => {
                tracing::debug!("Language detection failed, using en: {}", e);
                Language::En
            }
        }
    }
}
