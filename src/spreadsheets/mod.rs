pub mod csv_export;
pub mod csv_import;
pub mod export_xlsx;
pub mod table_export;

pub use csv_export::{check_export_size, export_filename, to_csv};
pub use csv_import::import_leads;
pub use export_xlsx::export_leads_xlsx;
pub use table_export::{to_excel_document, EXCEL_CONTENT_TYPE};
