pub mod export;
pub mod import_po;
pub mod package;
pub mod releases;
pub mod schema;

use crate::OutputFormat;
use color_eyre::eyre::Result;
use serde::Serialize;

/// Print `value` as pretty JSON when requested; returns whether it did.
pub(crate) fn print_json<T: Serialize>(format: OutputFormat, value: &T) -> Result<bool> {
    if format != OutputFormat::Json {
        return Ok(false);
    }
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(true)
}
