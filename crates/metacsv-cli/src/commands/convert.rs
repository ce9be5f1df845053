//! Convert command - rewrite a MetaCSV file as normalized MetaCSV or JSON.

use std::path::{Path, PathBuf};

use colored::Colorize;
use metacsv::{read_csv, write_csv, Dataset, Variable, WriteOptions};
use serde_json::{json, Map, Value as JsonValue};

use crate::cli::ConvertFormat;

pub fn run(
    format: ConvertFormat,
    readfile: PathBuf,
    writefile: Option<PathBuf>,
    header: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let writefile = match writefile {
        Some(path) => path,
        None => default_output(&readfile, format)?,
    };

    log::debug!("converting {} to {:?}", readfile.display(), format);
    let container = read_csv(&readfile, &super::read_options(header))?;

    match format {
        ConvertFormat::Csv => {
            write_csv(&container, &writefile, &WriteOptions::default())?;
        }
        ConvertFormat::Json => {
            let dataset = container.to_dataset()?;
            let text = serde_json::to_string_pretty(&dataset_to_json(&dataset)?)?;
            std::fs::write(&writefile, text)?;
        }
    }

    if verbose {
        println!("{}", container);
        println!();
    }
    println!(
        "{} {} {} {}",
        "Converted".green().bold(),
        readfile.display().to_string().white(),
        "->".dimmed(),
        writefile.display().to_string().white()
    );

    Ok(())
}

/// Output path next to the input with the format's extension.
fn default_output(readfile: &Path, format: ConvertFormat) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let output = readfile.with_extension(format.extension());
    if output == readfile {
        return Err(format!(
            "Output would overwrite the input file: {}\nPass WRITEFILE explicitly.",
            readfile.display()
        )
        .into());
    }
    Ok(output)
}

/// Render a dataset in the dims/coords/data_vars/attrs layout.
pub(crate) fn dataset_to_json(dataset: &Dataset) -> Result<JsonValue, serde_json::Error> {
    let coords = variables_to_json(dataset.coords().iter())?;
    let data_vars = variables_to_json(dataset.data_vars().iter())?;

    Ok(json!({
        "dims": dataset.dims(),
        "attrs": serde_json::to_value(dataset.attrs())?,
        "coords": coords,
        "data_vars": data_vars,
    }))
}

fn variables_to_json<'a>(
    variables: impl Iterator<Item = (&'a String, &'a Variable)>,
) -> Result<JsonValue, serde_json::Error> {
    let mut map = Map::new();
    for (name, variable) in variables {
        let data: Vec<JsonValue> = variable
            .data()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;
        map.insert(
            name.clone(),
            json!({
                "dims": variable.dims(),
                "shape": variable.shape(),
                "attrs": serde_json::to_value(variable.attrs())?,
                "data": data,
            }),
        );
    }
    Ok(JsonValue::Object(map))
}
