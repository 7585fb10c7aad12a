// src/spreadsheets/table_export.rs
//
// HTML table export. The same table wrapped in an Office-namespace document
// opens directly in Excel as a `.xls` file.

use maud::{html, Markup};

use crate::domain::lead::Lead;
use crate::spreadsheets::csv_export::{export_row, EXPORT_HEADERS};

pub const EXCEL_CONTENT_TYPE: &str = "application/vnd.ms-excel";

/// `<table>` with a header row and one row per lead. Cells are HTML-escaped.
pub fn to_html_table(leads: &[Lead]) -> Markup {
    html! {
        table {
            thead {
                tr {
                    @for header in EXPORT_HEADERS {
                        th { (header) }
                    }
                }
            }
            tbody {
                @for lead in leads {
                    tr {
                        @for cell in export_row(lead) {
                            td { (cell) }
                        }
                    }
                }
            }
        }
    }
}

pub fn to_excel_document(leads: &[Lead]) -> String {
    let table = to_html_table(leads).into_string();
    format!(
        "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
         xmlns:x=\"urn:schemas-microsoft-com:office:excel\" \
         xmlns=\"http://www.w3.org/TR/REC-html40\">\
         <head><meta charset=\"utf-8\"></head>\
         <body>{table}</body></html>"
    )
}
