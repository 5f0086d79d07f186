//! Config command handlers.

use std::path::Path;

use anyhow::Result;
use mtray_core::TrayConfig;
use mtray_core::config::paths;

pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}

pub fn init(path: &Path) -> Result<()> {
    if TrayConfig::init_at(path)? {
        println!("Created {}", path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}
