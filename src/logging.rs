//! Console logging setup using `tracing-subscriber`.
//!
//! Output goes to stderr so that previews printed to stdout stay clean.
//! `RUST_LOG` always wins over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "slackline=debug,info"
    } else {
        "warn"
    }
}

/// Initialise stderr logging for a CLI run.
///
/// Controlled by `RUST_LOG`, falling back to [`default_directive`].
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_cli(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
