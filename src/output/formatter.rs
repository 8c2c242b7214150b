//! Output formatting

use crate::lifecycle::Snapshot;
use crate::output::human::format_human;
use crate::output::json::format_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn format_output(snapshot: &Snapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(snapshot),
        OutputFormat::Json => format_json(snapshot),
    }
}
