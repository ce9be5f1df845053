//! Version command - print the `version` attribute.

use std::path::{Path, PathBuf};

use metacsv::{read_csv, ReadOptions};

pub fn run(readfile: PathBuf, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    match get_version(&readfile)? {
        Some(version) => {
            println!("{}", version);
            Ok(())
        }
        None => Err("No version found".into()),
    }
}

/// The `version` attribute as text, if present.
fn get_version(readfile: &Path) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let container = read_csv(readfile, &ReadOptions::default())?;
    let version = container.attrs().get("version").map(|v| match v {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    });
    Ok(version)
}
