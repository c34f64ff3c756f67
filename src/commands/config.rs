//! `awlights config`

use std::path::Path;

use awlights::config::AppConfig;
use awlights_core::StatusCode;

use super::CommandResult;

/// Write the default configuration
pub fn init(path: &Path, force: bool) -> CommandResult {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save(path)?;
    println!("Wrote {}", path.display());
    Ok(StatusCode::Success)
}

/// Print the configuration after command-line overrides
pub fn show(path: &Path, config: &AppConfig) -> CommandResult {
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(StatusCode::Success)
}
