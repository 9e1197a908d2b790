//! # Runtime Configuration Module
//!
//! Environment-derived configuration for the gateway's runtime behavior.
//!
//! ## Environment Variables
//!
//! ### `FNGATE_ENV`
//!
//! Execution mode. `development` enables verbose diagnostics (404 responses
//! list the registered function names, entry modules reload per request,
//! dev-console mutations pass the trusted-operation check). Anything
//! else is treated as production.
//!
//! ### `FNGATE_STACK_SIZE`
//!
//! Stack size for handler coroutines. Accepts values in:
//! - Decimal: `16384` (16 KB)
//! - Hexadecimal: `0x4000` (16 KB)
//!
//! Default: `0x4000` (16 KB)
//!
//! Larger stacks support deeper call chains; smaller stacks reduce memory for
//! many concurrent coroutines. Tune based on handler complexity.
//!
//! ## Usage
//!
//! ```rust
//! use fngate::runtime_config::{ExecutionMode, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env();
//! if config.mode == ExecutionMode::Development {
//!     println!("dev mode: verbose 404s and per-request entry reload");
//! }
//! ```

use std::env;

/// Distinguishes development from production behavior.
///
/// Affects error verbosity (404 bodies), entry-module caching, and the
/// dev-only entries in the trusted-operation allowlist. It never affects
/// routing or execution correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Development,
    #[default]
    Production,
}

impl ExecutionMode {
    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, ExecutionMode::Development)
    }
}

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// Development vs. production behavior
    pub mode: ExecutionMode,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("FNGATE_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        let mode = match env::var("FNGATE_ENV").as_deref() {
            Ok("development") => ExecutionMode::Development,
            _ => ExecutionMode::Production,
        };
        RuntimeConfig { stack_size, mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_predicate() {
        assert!(ExecutionMode::Development.is_development());
        assert!(!ExecutionMode::Production.is_development());
    }
}
