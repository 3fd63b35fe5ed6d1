//! Local prompt-injection screening
//!
//! A coarse keyword backstop that runs on every prompt independently of the
//! policy-decision service.

use crate::config::InjectionConfig;

/// Built-in vocabulary, checked in this order
pub const DEFAULT_VOCABULARY: &[&str] = &["ignore previous", "bypass", "password", "secret", "ssn"];

/// Result of screening a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenResult {
    /// Whether any vocabulary term was found
    pub flagged: bool,
    /// First vocabulary term found, in vocabulary order
    pub matched_term: Option<String>,
}

impl ScreenResult {
    fn clean() -> Self {
        Self {
            flagged: false,
            matched_term: None,
        }
    }
}

/// Case-insensitive substring screener over a fixed vocabulary
#[derive(Debug, Clone)]
pub struct InjectionScreener {
    /// Lower-cased terms
    vocabulary: Vec<String>,
}

impl Default for InjectionScreener {
    fn default() -> Self {
        Self::new(InjectionConfig::default())
    }
}

impl InjectionScreener {
    /// Built-in vocabulary followed by any configured extra terms
    pub fn new(config: InjectionConfig) -> Self {
        let mut vocabulary: Vec<String> = DEFAULT_VOCABULARY.iter().map(|t| t.to_string()).collect();
        for term in config.extra_terms {
            let term = term.trim().to_lowercase();
            if !term.is_empty() && !vocabulary.contains(&term) {
                vocabulary.push(term);
            }
        }
        Self { vocabulary }
    }

    /// Terms in match order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Flag `text` if it contains any vocabulary term
    pub fn screen(&self, text: &str) -> ScreenResult {
        let text_lower = text.to_lowercase();
        self.vocabulary
            .iter()
            .find(|term| text_lower.contains(term.as_str()))
            .map(|term| ScreenResult {
                flagged: true,
                matched_term: Some(term.clone()),
            })
            .unwrap_or_else(ScreenResult::clean)
    }
}
