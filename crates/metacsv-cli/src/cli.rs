//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// MetaCSV: documentation-aware CSV files
#[derive(Parser)]
#[command(name = "metacsv")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a MetaCSV file to another format
    Convert {
        /// Type of file to write
        #[arg(value_name = "FORMAT")]
        format: ConvertFormat,

        /// Input MetaCSV file
        #[arg(value_name = "READFILE")]
        readfile: PathBuf,

        /// Output file (default: derived from the input name)
        #[arg(value_name = "WRITEFILE")]
        writefile: Option<PathBuf>,

        /// Metadata-only header file for the input
        #[arg(long)]
        header: Option<PathBuf>,
    },

    /// Extract the metadata block into a header-only file
    Header {
        /// Input MetaCSV file
        #[arg(value_name = "READFILE")]
        readfile: PathBuf,

        /// Output header file
        #[arg(value_name = "WRITEFILE")]
        writefile: PathBuf,
    },

    /// Print the `version` attribute of a MetaCSV file
    Version {
        /// Input MetaCSV file
        #[arg(value_name = "READFILE")]
        readfile: PathBuf,
    },

    /// Show attributes, coordinates and variables of a MetaCSV file
    Info {
        /// Input MetaCSV file
        #[arg(value_name = "READFILE")]
        readfile: PathBuf,

        /// Metadata-only header file for the input
        #[arg(long)]
        header: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConvertFormat {
    /// MetaCSV with a normalized header
    Csv,
    /// Dataset as JSON (dims, coords, data_vars, attrs)
    Json,
}

impl ConvertFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ConvertFormat::Csv => "csv",
            ConvertFormat::Json => "json",
        }
    }
}
