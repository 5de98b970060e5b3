//! Show or write the configuration file.

use reelcut_common::config::AppConfig;

pub fn run(write: bool, config: &AppConfig) -> anyhow::Result<()> {
    if write {
        config.save()?;
        println!("Configuration written to: {}", AppConfig::path().display());
    } else {
        println!("# {}", AppConfig::path().display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
