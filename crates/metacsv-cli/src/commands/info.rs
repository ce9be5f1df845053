//! Info command - show the metadata of a MetaCSV file.

use std::path::PathBuf;

use colored::Colorize;
use metacsv::{read_csv, Tabular};

pub fn run(
    readfile: PathBuf,
    header: Option<PathBuf>,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let container = read_csv(&readfile, &super::read_options(header))?;
    let table = container.table();

    if json_output {
        let coords = match container.coords() {
            Some(graph) => serde_json::to_value(graph.to_declaration().to_yaml())?,
            None => serde_json::Value::Null,
        };
        let info = serde_json::json!({
            "file": readfile.display().to_string(),
            "rows": table.len(),
            "index": table.index().named_levels(),
            "columns": table.column_names(),
            "attrs": serde_json::to_value(container.attrs().to_yaml())?,
            "coords": coords,
            "base_coords": container.base_coords(),
            "variables": serde_json::to_value(container.variables().to_yaml())?,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "MetaCSV file".cyan().bold(),
        readfile.display().to_string().white()
    );
    println!();
    println!("{}", container);

    Ok(())
}
