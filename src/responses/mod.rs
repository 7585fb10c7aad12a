pub mod attachment;
pub mod errors;
pub mod json;

pub use errors::{error_to_response, ResultResp};

pub use attachment::{attachment_response, xlsx_response};
pub use json::{json_response, json_response_with_status};
