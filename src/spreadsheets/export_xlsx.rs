use crate::domain::lead::Lead;
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use crate::spreadsheets::csv_export::{export_row, EXPORT_HEADERS};
use rust_xlsxwriter::{Format, Workbook};

// Index of the numeric column within `EXPORT_HEADERS`.
const BUDGET_COL: usize = 7;

pub fn export_leads_xlsx(leads: &[Lead], filename: &str) -> ResultResp {
    let buffer = leads_workbook(leads)?;
    xlsx_response(buffer, filename)
}

/// Workbook bytes with one sheet: a bold header row, then one row per lead.
/// Budget is written as a number so it sums in Excel.
pub fn leads_workbook(leads: &[Lead]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    worksheet
        .set_name("Leads")
        .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {}", e)))?;

    // Headers
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows
    for (i, lead) in leads.iter().enumerate() {
        let r = (i + 1) as u32;

        for (col, cell) in export_row(lead).iter().enumerate() {
            let written = if col == BUDGET_COL {
                worksheet.write_number(r, col as u16, lead.budget as f64)
            } else {
                worksheet.write_string(r, col as u16, cell)
            };
            written.map_err(|e| {
                ServerError::XlsxError(format!(
                    "Failed to write {} for {}: {}",
                    EXPORT_HEADERS[col], lead.id, e
                ))
            })?;
        }
    }

    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))?;

    Ok(buffer)
}
