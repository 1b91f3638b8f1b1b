use std::io::{self, IsTerminal};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Diagnostics go to stderr so stdout only
/// carries the summary or echoed templates. `RUST_LOG` overrides the default
/// `warn` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

/// Echo defaults to on when stdout is piped, e.g. `roundseq debug.log | less`
pub fn stdout_is_piped() -> bool {
    !io::stdout().is_terminal()
}
