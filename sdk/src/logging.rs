// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Returns false if a subscriber was already installed, in which case nothing changes.
pub fn setup_logging(level: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        // Another test may have installed a subscriber already.
        setup_logging("debug", LogFormat::Text);
        assert!(!setup_logging("info", LogFormat::Json));
    }
}
