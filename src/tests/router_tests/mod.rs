mod bulk_tests;
mod import_export_tests;
mod layout_tests;
mod lead_tests;

use crate::router::AppState;
use crate::tests::utils::{init_test_db, test_config};

pub fn test_state() -> AppState {
    AppState::new(init_test_db(), test_config())
}
