//! Identifier normalization policies.
//!
//! Field and optional-scope names must already be in the canonical form of
//! the active policy; the composer compares a name against its normalized
//! form and rejects it on mismatch instead of silently correcting it.

use serde::{Deserialize, Serialize};

/// Maps a raw identifier to its canonical public form. Must be pure.
pub trait Normalizer {
    fn normalize(&self, name: &str) -> String;
}

/// Initialisms kept fully upper case by [`PublicCamel`].
const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "URI", "URL", "UTF8", "UUID", "VM", "XML",
];

/// `lower_snake_case` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCase;

impl Normalizer for SnakeCase {
    fn normalize(&self, name: &str) -> String {
        split_words(name)
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Exported `CamelCase` identifiers with upper-case initialisms
/// (`user_id` -> `UserID`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicCamel;

impl Normalizer for PublicCamel {
    fn normalize(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for word in split_words(name) {
            let upper = word.to_uppercase();
            if INITIALISMS.contains(&upper.as_str()) {
                out.push_str(&upper);
                continue;
            }
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(&chars.as_str().to_lowercase());
            }
        }
        out
    }
}

/// Naming policy selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    #[default]
    Snake,
    Camel,
}

impl NamingPolicy {
    pub fn normalizer(self) -> Box<dyn Normalizer> {
        match self {
            NamingPolicy::Snake => Box::new(SnakeCase),
            NamingPolicy::Camel => Box::new(PublicCamel),
        }
    }
}

/// Splits an identifier into words on any non-alphanumeric character,
/// lower-to-upper transitions and the end of an upper-case run
/// (`HTTPServer` -> `HTTP`, `Server`). Digits stay with the preceding word.
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut cur = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !cur.is_empty() {
                words.push(std::mem::take(&mut cur));
            }
            continue;
        }
        if c.is_uppercase() && !cur.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                words.push(std::mem::take(&mut cur));
            }
        }
        cur.push(c);
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    words
}
