// responses/attachment.rs
use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Text export (CSV, HTML-as-XLS) as a download
pub fn attachment_response(body: String, content_type: &str, filename: &str) -> ResultResp {
    download(Body::from(body), content_type, filename)
}

/// Workbook bytes as a download
pub fn xlsx_response(buffer: Vec<u8>, filename: &str) -> ResultResp {
    download(Body::from(buffer), XLSX_CONTENT_TYPE, filename)
}

fn download(body: Body, content_type: &str, filename: &str) -> ResultResp {
    let resp = ResponseBuilder::new()
        .status(200)
        .header("Content-Type", content_type)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        )
        .body(body)
        .map_err(|_| ServerError::InternalError)?;

    Ok(resp)
}
