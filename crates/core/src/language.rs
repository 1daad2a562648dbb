//! Supported response languages
//!
//! The advisor serves an English/Russian storefront. The detected language
//! steers only the final generation instruction; it never changes filtering.

use serde::{Deserialize, Serialize};

/// Supported output languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    /// Get ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Russian => "ru",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Russian => "Russian",
        }
    }

    /// Instruction fragment appended to the final generation call
    pub fn reply_instruction(&self) -> &'static str {
        match self {
            Self::English => "Respond in English.",
            Self::Russian => "Respond in Russian.",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Some(Self::English),
            "ru" | "rus" | "russian" => Some(Self::Russian),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
