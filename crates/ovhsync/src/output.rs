//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders attribute bags in the format selected by `--output`. Table uses
//! `tabled` key/value rows, structured formats use serde, plain emits the
//! resource identifier only.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use ovhsync_core::Attributes;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Where and how command results are printed.
#[derive(Debug, Clone, Copy)]
pub struct OutputOpts {
    pub format: OutputFormat,
    pub quiet: bool,
}

// ── Rows and records ─────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// What structured formats print: the identifier plus every attribute.
#[derive(Serialize)]
struct Record<'a> {
    id: &'a str,
    #[serde(flatten)]
    attributes: &'a Attributes,
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) if s.is_empty() => "-".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one resource's attributes in the chosen format.
pub fn render_attributes(
    format: OutputFormat,
    id: &str,
    attributes: &Attributes,
) -> Result<String, CliError> {
    let record = Record { id, attributes };
    match format {
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = std::iter::once(FieldRow {
                field: "id".into(),
                value: id.into(),
            })
            .chain(attributes.iter().map(|(k, v)| FieldRow {
                field: k.clone(),
                value: display_value(v),
            }))
            .collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(&record, false),
        OutputFormat::JsonCompact => render_json(&record, true),
        OutputFormat::Yaml => render_yaml(&record),
        OutputFormat::Plain => Ok(id.to_owned()),
    }
}

/// Render any serializable value; tables fall back to pretty JSON.
pub fn render_value<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Json | OutputFormat::Plain => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
