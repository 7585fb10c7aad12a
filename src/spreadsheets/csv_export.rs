// src/spreadsheets/csv_export.rs

use chrono::{NaiveDate, SecondsFormat};
use csv::{QuoteStyle, WriterBuilder};

use crate::domain::lead::Lead;
use crate::errors::ServerError;

/// Column order shared by every export format.
pub const EXPORT_HEADERS: [&str; 11] = [
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "Source",
    "Status",
    "Temperature",
    "Budget",
    "Address",
    "Tags",
    "Created At",
];

/// One lead as export cells, in `EXPORT_HEADERS` order.
pub fn export_row(lead: &Lead) -> [String; 11] {
    [
        lead.first_name.clone(),
        lead.last_name.clone(),
        lead.email.clone(),
        lead.phone.clone(),
        lead.source.clone(),
        lead.status.as_str().to_string(),
        lead.temperature.as_str().to_string(),
        lead.budget.to_string(),
        lead.property_address.clone(),
        lead.tags.join(";"),
        lead.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    ]
}

/// Serializes leads in the given order. Every field is quoted; embedded quotes
/// are doubled and embedded newlines stay inside the quoted field.
pub fn to_csv(leads: &[Lead]) -> Result<String, ServerError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for lead in leads {
        writer.write_record(export_row(lead))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServerError::CsvError(format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ServerError::CsvError(format!("CSV is not UTF-8: {e}")))
}

/// `agent_desk_leads_2024-03-01.csv`
pub fn export_filename(today: NaiveDate, extension: &str) -> String {
    format!("agent_desk_leads_{}.{extension}", today.format("%Y-%m-%d"))
}

/// Refuses result sets above the configured row limit.
pub fn check_export_size(rows: usize, max_rows: usize) -> Result<(), ServerError> {
    if rows > max_rows {
        return Err(ServerError::PayloadTooLarge {
            size: rows,
            limit: max_rows,
        });
    }
    Ok(())
}
