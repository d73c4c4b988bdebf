use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// Inset guidance generator for ISO 11783-10 task data.
///
/// The inset distance and output path may be given positionally or by flag,
/// mirroring the classic `InsetXml <inset_feet> <output>` invocation.
#[derive(Parser, Debug)]
#[command(name = "InsetXml", version, about)]
pub struct Cli {
    /// Input ISO 11783 file (.xml or .zip)
    #[arg(short, long, default_value = "TASKDATA.XML", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Inset distance in feet (must be > 0.5)
    #[arg(short = 'd', long = "inset", value_name = "FEET")]
    pub inset: Option<f64>,

    /// Name for the generated swaths
    #[arg(short, long, default_value = "Inset")]
    pub name: String,

    /// Output file path (.xml, .wkt, or .zip)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Inset distance in feet (positional form)
    #[arg(value_name = "inset_feet")]
    pub inset_pos: Option<f64>,

    /// Output file path (positional form)
    #[arg(value_name = "output", value_hint = ValueHint::FilePath)]
    pub output_pos: Option<PathBuf>,
}

/// Validated options, ready to run.
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    pub inset_feet: f64,
    pub name: String,
}

const INPUT_EXTENSIONS: [&str; 3] = ["xml", "XML", "zip"];
const OUTPUT_EXTENSIONS: [&str; 5] = ["xml", "XML", "wkt", "WKT", "zip"];

fn extension(path: &std::path::Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

impl Cli {
    /// Resolve positional/flag argument pairs and check every constraint the
    /// run depends on. Violations are argument errors (exit code 2).
    pub fn validate(self) -> Result<Options, String> {
        let inset_feet = match (self.inset, self.inset_pos) {
            (Some(_), Some(_)) => {
                return Err("inset distance given both as a flag and positionally".into())
            }
            (Some(d), None) | (None, Some(d)) => d,
            (None, None) => return Err("inset distance is required".into()),
        };
        let output = match (self.output, self.output_pos) {
            (Some(_), Some(_)) => {
                return Err("output path given both as a flag and positionally".into())
            }
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => return Err("output path is required".into()),
        };

        if inset_feet <= 0.5 {
            return Err("inset distance must be > 0.5 ft".into());
        }
        if output == self.input {
            return Err("output file must be different than input file".into());
        }
        if !INPUT_EXTENSIONS.contains(&extension(&self.input)) {
            return Err("input file extension must be .xml or .zip".into());
        }
        if !OUTPUT_EXTENSIONS.contains(&extension(&output)) {
            return Err("output file extension must be .xml, .wkt, or .zip".into());
        }

        Ok(Options {
            input: self.input,
            output,
            inset_feet,
            name: self.name,
        })
    }
}
