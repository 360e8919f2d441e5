//! Style platform - capability flag, compiled sheets and object URLs.
//!
//! The capability flag is computed once per process. Set
//! `SPARK_ELEMENT_ADOPT_STYLES=0` to force the fallback path (hosts that
//! cannot adopt compiled sheets and load styles through link nodes instead).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::config::parse_flag;

// =============================================================================
// Capability Flag
// =============================================================================

static SUPPORTS_ADOPTING_STYLE_SHEETS: Lazy<bool> = Lazy::new(|| {
    let supported = std::env::var("SPARK_ELEMENT_ADOPT_STYLES")
        .ok()
        .and_then(|text| parse_flag(&text))
        .unwrap_or(true);
    tracing::debug!(supported, "style sheet adoption capability detected");
    supported
});

/// Whether the platform shares synchronously replaceable compiled sheets.
pub fn supports_adopting_style_sheets() -> bool {
    *SUPPORTS_ADOPTING_STYLE_SHEETS
}

// =============================================================================
// Compiled Style Sheet
// =============================================================================

/// A constructed style sheet, split into top-level rules.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompiledStyleSheet {
    css_text: String,
    rules: Vec<String>,
}

impl CompiledStyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sheet's contents synchronously.
    pub fn replace_sync(&mut self, css_text: &str) {
        self.css_text = css_text.to_string();
        self.rules = split_rules(css_text);
    }

    pub fn css_text(&self) -> &str {
        &self.css_text
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

/// Split on top-level closing braces. Nested blocks stay inside their rule.
fn split_rules(css_text: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in css_text.chars() {
        current.push(ch);
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let rule = current.trim();
                    if !rule.is_empty() {
                        rules.push(rule.to_string());
                    }
                    current.clear();
                }
            }
            _ => {}
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        rules.push(rest.to_string());
    }
    rules
}

// =============================================================================
// Object URLs
// =============================================================================

/// Live object URLs and their content.
static OBJECT_URLS: Lazy<Mutex<HashMap<String, Arc<str>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Counter for generating unique URLs.
static NEXT_OBJECT_URL: AtomicU64 = AtomicU64::new(0);

/// Register `content` under a fresh transient location.
pub fn create_object_url(content: Arc<str>, mime: &str) -> String {
    let id = NEXT_OBJECT_URL.fetch_add(1, Ordering::Relaxed);
    let url = format!("blob:spark-element/{mime}/{id}");
    OBJECT_URLS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(url.clone(), content);
    url
}

/// Invalidate a location. Consumers that already loaded it keep the content.
pub fn revoke_object_url(url: &str) {
    OBJECT_URLS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(url);
}

/// Content behind a live location.
pub fn resolve_object_url(url: &str) -> Option<Arc<str>> {
    OBJECT_URLS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(url)
        .cloned()
}

/// Total object URLs created by this process.
pub fn object_urls_created() -> u64 {
    NEXT_OBJECT_URL.load(Ordering::Relaxed)
}

// =============================================================================
// Tests
// =============================================================================
