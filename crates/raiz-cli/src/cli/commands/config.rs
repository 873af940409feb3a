//! Config command handlers.

use anyhow::{Context, Result};
use raiz_core::config;
use raiz_core::i18n::Language;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn language(lang: Language) -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::save_language_to(&config_path, lang)
        .with_context(|| format!("save language to {}", config_path.display()))?;
    println!("Saved language '{lang}' to {}", config_path.display());
    Ok(())
}

pub fn generate() -> Result<()> {
    let toml = config::Config::generate()?;
    print!("{toml}");
    Ok(())
}
