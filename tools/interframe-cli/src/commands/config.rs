//! Print the effective configuration.

use serde::Serialize;

use interframe_common::config::{config_file_path, AppConfig};

#[derive(Serialize)]
struct ConfigReport<'a> {
    path: String,
    exists: bool,
    config: &'a AppConfig,
}

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let path = config_file_path();
    let report = ConfigReport {
        exists: path.exists(),
        path: path.display().to_string(),
        config,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
