//! Header command - extract the metadata block into its own file.

use std::path::PathBuf;

use colored::Colorize;
use metacsv::{read_csv, write_header, ReadOptions};

pub fn run(
    readfile: PathBuf,
    writefile: PathBuf,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let container = read_csv(&readfile, &ReadOptions::default())?;

    if container.metadata().is_empty() {
        return Err(format!("No metadata found in {}", readfile.display()).into());
    }

    log::debug!("extracting header of {}", readfile.display());
    write_header(&writefile, container.metadata())?;

    println!(
        "{} {}",
        "Wrote header".green().bold(),
        writefile.display().to_string().white()
    );
    Ok(())
}
