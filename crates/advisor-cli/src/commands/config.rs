use crate::client::{Overrides, load_config};
use advisor_infrastructure::ConfigService;
use anyhow::{Context, Result};

pub fn init() -> Result<()> {
    let service = ConfigService::new()?;
    let created = service
        .ensure_config_file()
        .with_context(|| format!("Failed to write {}", service.path().display()))?;

    if created {
        println!("✅ Created {}", service.path().display());
    } else {
        println!("Config file already exists: {}", service.path().display());
    }
    Ok(())
}

pub fn show(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
