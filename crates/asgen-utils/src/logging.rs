//! Structured logging setup.
//!
//! Mirrors the teacher's `tracing` + `tracing-subscriber` setup: a
//! compact human format by default, a verbose structured format behind
//! `--verbose`, honoring `NO_COLOR`.

use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the global tracing subscriber. Safe to call once per
/// process; a second call returns an error that callers should ignore
/// (tests call this repeatedly).
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        if verbose {
            EnvFilter::try_new("asgen=debug,info")
        } else {
            EnvFilter::try_new("asgen=info,warn")
        }
    })?;

    let color = use_color();

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(color)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(color)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}
