//! Tracing subscriber setup.
//!
//! Log lines go to stderr so stdout stays reserved for command output and
//! JSON envelopes. `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter for a run with or without `--verbose`.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "enrollkit=debug,pagefetch=debug"
    } else {
        "enrollkit=info,pagefetch=info"
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
