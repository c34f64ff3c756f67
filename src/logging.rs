//! Tracing subscriber setup
//!
//! Installed once by the binary. `RUST_LOG` wins over the configured level.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Build the filter from `RUST_LOG`, falling back to `level`
pub fn filter(level: &str, directives: &[&str]) -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    for directive in directives {
        let directive: Directive = directive.parse()?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Install the global subscriber
pub fn init(level: &str, format: LogFormat, directives: &[&str]) -> anyhow::Result<()> {
    let filter = filter(level, directives)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Simple => builder.without_time().with_target(true).try_init(),
        LogFormat::Verbose => builder
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Cannot install logger: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_directive_is_an_error() {
        assert!(filter("info", &["awlights_transport=loud"]).is_err());
        assert!(filter("info", &["awlights_transport=debug"]).is_ok());
    }
}
