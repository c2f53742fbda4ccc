use super::CliError;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub(super) fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global stderr subscriber. `RUST_LOG` refines the level chosen
/// by `-v`, except under `--quiet`.
pub(super) fn setup_logging(verbosity: u8, quiet: bool) -> Result<(), CliError> {
    let level = level_for(verbosity, quiet);
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy()
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|error| CliError::Internal(anyhow::anyhow!("failed to install logger: {error}")))
}

#[cfg(test)]
mod tests {
    use super::level_for;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn verbosity_maps_to_increasing_levels() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(7, false), LevelFilter::TRACE);
    }

    #[test]
    fn quiet_silences_everything() {
        assert_eq!(level_for(3, true), LevelFilter::OFF);
    }
}
