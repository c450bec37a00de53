//! Diagnostic logging on stderr.
//!
//! `RUST_LOG` wins when set. Otherwise only warnings are shown, or debug
//! output for this workspace's crates with `--verbose`.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub fn init(verbose: bool, color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    let console = layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_ansi(color)
        .without_time()
        .with_filter(filter);

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::registry().with(console).try_init();
}

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse_lossy("cipherpad_core=debug,cipherpad_cli=debug")
    } else {
        EnvFilter::new(LevelFilter::WARN.to_string())
    }
}
