//! Runtime configuration.
//!
//! Settings are reactive signals so host code can observe them with
//! `effect`. Defaults can be overridden from the environment with
//! [`load_from_env`]:
//!
//! - `SPARK_ELEMENT_RENDER_TARGET` = `isolated` | `same-node`
//! - `SPARK_ELEMENT_REENTRANCY_DIAGNOSTICS` = `0` | `1`
//!
//! The style platform flag (`SPARK_ELEMENT_ADOPT_STYLES`) is process-wide and
//! lives in [`crate::style::platform`].

use std::cell::RefCell;

use spark_signals::{signal, Signal};

// =============================================================================
// Render Target Mode
// =============================================================================

/// Where a component commits its output when it does not override
/// `create_render_target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTargetMode {
    /// Render into an isolated boundary (shadow root) attached to the host.
    #[default]
    Isolated,
    /// Render directly into the host node.
    SameNode,
}

impl RenderTargetMode {
    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "isolated" | "shadow" => Some(Self::Isolated),
            "same-node" | "same_node" | "light" => Some(Self::SameNode),
            _ => None,
        }
    }
}

thread_local! {
    static RENDER_TARGET_MODE: RefCell<Signal<RenderTargetMode>> =
        RefCell::new(signal(RenderTargetMode::Isolated));
    static REENTRANCY_DIAGNOSTICS: RefCell<Signal<bool>> = RefCell::new(signal(true));
}

/// Get the default render target mode.
pub fn render_target_mode() -> RenderTargetMode {
    RENDER_TARGET_MODE.with(|m| m.borrow().get())
}

/// Set the default render target mode for elements connected afterwards.
pub fn set_render_target_mode(mode: RenderTargetMode) {
    RENDER_TARGET_MODE.with(|m| m.borrow().set(mode));
}

/// Get the render target mode signal for reactive tracking.
pub fn render_target_mode_signal() -> Signal<RenderTargetMode> {
    RENDER_TARGET_MODE.with(|m| m.borrow().clone())
}

// =============================================================================
// Re-entrancy Diagnostics
// =============================================================================

/// Whether re-entrant writes emit diagnostics.
pub fn reentrancy_diagnostics() -> bool {
    REENTRANCY_DIAGNOSTICS.with(|d| d.borrow().get())
}

/// Enable or disable re-entrancy diagnostics.
pub fn set_reentrancy_diagnostics(enabled: bool) {
    REENTRANCY_DIAGNOSTICS.with(|d| d.borrow().set(enabled));
}

// =============================================================================
// Environment
// =============================================================================

/// Apply overrides from `SPARK_ELEMENT_*` environment variables.
///
/// Unknown values are ignored with a warning.
pub fn load_from_env() {
    if let Ok(text) = std::env::var("SPARK_ELEMENT_RENDER_TARGET") {
        match RenderTargetMode::parse(&text) {
            Some(mode) => set_render_target_mode(mode),
            None => tracing::warn!(value = %text, "ignoring unknown SPARK_ELEMENT_RENDER_TARGET"),
        }
    }

    if let Ok(text) = std::env::var("SPARK_ELEMENT_REENTRANCY_DIAGNOSTICS") {
        match parse_flag(&text) {
            Some(enabled) => set_reentrancy_diagnostics(enabled),
            None => tracing::warn!(
                value = %text,
                "ignoring unknown SPARK_ELEMENT_REENTRANCY_DIAGNOSTICS"
            ),
        }
    }
}

/// Parse a boolean environment flag.
pub(crate) fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Restore defaults (tests).
pub fn reset_config() {
    set_render_target_mode(RenderTargetMode::Isolated);
    set_reentrancy_diagnostics(true);
}

// =============================================================================
// Tests
// =============================================================================
