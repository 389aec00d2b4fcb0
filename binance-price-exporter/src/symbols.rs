//! Resolution of the symbol list tracked on each scrape.

/// Symbols tracked when no override is configured.
pub const DEFAULT_SYMBOLS: [&str; 3] = ["BTCUSDT", "ETHUSDT", "BNBUSDT"];

/// Resolves symbols from an environment variable, falling back to
/// [`DEFAULT_SYMBOLS`].
///
/// The variable is read on every call so that a changed environment is
/// picked up by the next scrape.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    env_var: String,
}

impl SymbolResolver {
    /// Create a resolver reading the given environment variable.
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    /// Name of the override variable.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolve the current symbol list. Never fails.
    pub fn resolve(&self) -> Vec<String> {
        let value = std::env::var(&self.env_var).ok();
        symbols_from_override(value.as_deref())
    }
}

/// Split a comma-separated override into symbols.
///
/// Elements are kept as-is: no trimming, no case normalisation, and empty
/// elements between commas are preserved. A missing or empty override
/// yields [`DEFAULT_SYMBOLS`].
pub fn symbols_from_override(value: Option<&str>) -> Vec<String> {
    match value {
        Some(v) if !v.is_empty() => v.split(',').map(str::to_string).collect(),
        _ => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
    }
}
