//! Shared helpers for command handlers.

use std::path::Path;

use ovhsync_core::{AttributeMapping, Attributes};

use crate::error::CliError;
use crate::output::{self, OutputOpts};

/// Read a desired-state attribute bag from a JSON file.
pub fn read_desired<T: AttributeMapping>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path)?;
    let attrs: Attributes = serde_json::from_str(&content)?;
    Ok(T::from_attributes(&attrs)?)
}

/// Print an object's attributes, or a notice when it no longer exists.
pub fn print_state(
    id: &str,
    attributes: Option<&Attributes>,
    out: &OutputOpts,
) -> Result<(), CliError> {
    match attributes {
        Some(attrs) => {
            let rendered = output::render_attributes(out.format, id, attrs)?;
            output::print_output(&rendered, out.quiet);
        }
        None => {
            if !out.quiet {
                eprintln!("{id} no longer exists; local state cleared");
            }
        }
    }
    Ok(())
}

pub fn print_deleted(id: &str, out: &OutputOpts) {
    if !out.quiet {
        eprintln!("{id} deleted");
    }
}
