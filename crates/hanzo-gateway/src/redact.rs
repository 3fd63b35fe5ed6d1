//! PII redaction on backend output
//!
//! Rules run sequentially over the whole text, each match replaced by a fixed
//! placeholder. Rule order is fixed: email, SSN, 12-digit ID. Email runs first
//! because a removed address can expose a word boundary next to digits; with
//! this order a second pass never finds anything new, so `redact` is
//! idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
});

static SSN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn pattern"));

static NATIONAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{12}\b").expect("id pattern"));

static DEFAULT_REDACTOR: Lazy<Redactor> = Lazy::new(Redactor::new);

/// Kinds of PII the redactor replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedactionKind {
    /// Email address
    Email,
    /// US Social Security Number, `ddd-dd-dddd`
    Ssn,
    /// 12-digit identification number
    NationalId,
}

impl RedactionKind {
    /// Placeholder token substituted for each match
    pub fn placeholder(&self) -> &'static str {
        match self {
            RedactionKind::Email => "<EMAIL>",
            RedactionKind::Ssn => "<SSN>",
            RedactionKind::NationalId => "<ID>",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            RedactionKind::Email => &EMAIL,
            RedactionKind::Ssn => &SSN,
            RedactionKind::NationalId => &NATIONAL_ID,
        }
    }
}

impl std::fmt::Display for RedactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedactionKind::Email => write!(f, "Email"),
            RedactionKind::Ssn => write!(f, "SSN"),
            RedactionKind::NationalId => write!(f, "ID"),
        }
    }
}

/// Number of replacements a rule made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionCount {
    pub kind: RedactionKind,
    pub count: usize,
}

/// Ordered pattern-to-placeholder redactor
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Vec<RedactionKind>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Redactor {
    /// Redactor with the standard rule order
    pub fn new() -> Self {
        Self {
            rules: vec![
                RedactionKind::Email,
                RedactionKind::Ssn,
                RedactionKind::NationalId,
            ],
        }
    }

    /// Rules in application order
    pub fn rules(&self) -> &[RedactionKind] {
        &self.rules
    }

    /// Replace every PII match with its placeholder
    pub fn redact(&self, text: &str) -> String {
        self.redact_with_report(text).0
    }

    /// Redact and report how many matches each rule replaced
    pub fn redact_with_report(&self, text: &str) -> (String, Vec<RedactionCount>) {
        let mut out = text.to_string();
        let mut report = Vec::new();

        for kind in &self.rules {
            let pattern = kind.pattern();
            let count = pattern.find_iter(&out).count();
            if count == 0 {
                continue;
            }
            out = pattern
                .replace_all(&out, kind.placeholder())
                .into_owned();
            report.push(RedactionCount {
                kind: *kind,
                count,
            });
        }

        (out, report)
    }
}

/// Redact with the standard rules
pub fn redact(text: &str) -> String {
    DEFAULT_REDACTOR.redact(text)
}
