//! Log setup for the command line.

use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. Logs go to stderr so they never mix with
/// the records on stdout.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Accept the level names of other logging systems as well.
fn directive(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    let directive = match level.as_str() {
        "warning" | "" => "warn",
        "critical" | "fatal" => "error",
        other => other,
    };
    directive.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        assert_eq!(directive("WARNING"), "warn");
        assert_eq!(directive("critical"), "error");
        assert_eq!(directive("Debug"), "debug");
        assert_eq!(directive(""), "warn");
        assert_eq!(directive("schemalint_core=trace"), "schemalint_core=trace");
    }
}
