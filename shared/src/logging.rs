//! Shared logging utilities for consistent tracing across the workspace
//!
//! Components never log through a global handle of their own. Each one is
//! given a [`tracing::Span`] when it is built and runs its work inside it, so
//! every event carries the component's identity.

use tracing::{error, info, Span};
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are shown at the requested level
const WORKSPACE_CRATES: &[&str] = &["lookout", "probes", "shared"];

/// Build the filter directive string for a base level
pub fn filter_directives(base_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{krate}={base_level}"))
        .collect();
    directives.push("reqwest=warn".to_string());
    directives.push("hyper=warn".to_string());
    directives.join(",")
}

/// Initialize the stdout tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    let base_level = log_level.unwrap_or("info");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(base_level)));

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Span identifying one component instance, e.g. `("checker", "cid_contact")`
pub fn component_span(kind: &'static str, name: &str) -> Span {
    tracing::info_span!("component", kind, name = %name)
}

/// Contextual logging helper for startup
pub fn log_startup(details: &str) {
    info!("🚀 Starting {}", details);
}

/// Contextual logging helper for shutdown
pub fn log_shutdown(reason: &str) {
    info!("🛑 Shutting down: {}", reason);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(err = %error, "❌ {} failed", context);
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!("✅ {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_cover_workspace() {
        let directives = filter_directives("debug");
        assert!(directives.contains("lookout=debug"));
        assert!(directives.contains("probes=debug"));
        assert!(directives.contains("shared=debug"));
        assert!(directives.contains("reqwest=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
