use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set
pub fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,prv={level}")
}

/// Install the global stderr subscriber. `RUST_LOG` takes precedence.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0), "warn,prv=warn");
        assert_eq!(default_directive(2), "warn,prv=debug");
        assert_eq!(default_directive(9), "warn,prv=trace");
    }
}
