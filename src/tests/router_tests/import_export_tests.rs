// src/tests/router_tests/import_export_tests.rs

use super::test_state;
use crate::router::{handle, AppState};
use crate::tests::utils::{
    body_bytes, body_json, body_string, get, post_text, test_config, ExpectError,
};
use serde_json::json;

fn import(state: &AppState, csv: &str) -> serde_json::Value {
    let resp = handle(post_text("/leads/import", "text/csv", csv), state).unwrap();
    assert_eq!(resp.status(), 200);
    body_json(resp)
}

#[test]
fn import_reports_count_and_persists() {
    let state = test_state();
    let summary = import(&state, "firstname,lastname,email,budget\nJane,Doe,jane@x.com,500000\n,,,");

    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"], 1);

    let list = body_json(handle(get("/leads"), &state).unwrap());
    assert_eq!(list["total_count"], 1);
    assert_eq!(list["items"][0]["estimated_deal_value"], 15000);
    assert_eq!(list["items"][0]["source"], "CSV Import");
}

#[test]
fn oversized_import_is_413() {
    let mut config = test_config();
    config.limits.max_import_bytes = 16;
    let state = AppState::new(crate::tests::utils::init_test_db(), config);

    let err = handle(
        post_text("/leads/import", "text/csv", "firstname,lastname\nJane,Doe\nJohn,Roe"),
        &state,
    )
    .expect_error();
    assert_eq!(err.status(), 413);
}

#[test]
fn csv_export_is_quoted_attachment() {
    let state = test_state();
    import(&state, "firstname,lastname,email,source,tags\nAnn,Lee,ann@x.com,Zillow,Buyer;VIP");

    let resp = handle(get("/leads/export.csv"), &state).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["Content-Type"], "text/csv; charset=utf-8");
    let disposition = resp.headers()["Content-Disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"agent_desk_leads_"));
    assert!(disposition.ends_with(".csv\""));

    let body = body_string(resp);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(r#""Ann","Lee","ann@x.com","(000) 000-0000","Zillow","NEW","NORMAL","0","","Buyer;VIP","#));
}

#[test]
fn export_respects_filter_and_sort() {
    let state = test_state();
    import(
        &state,
        "name,source,budget\nAnn Lee,Zillow,100\nBo Ray,Referral,300\nCy Fox,Zillow,200",
    );

    let body = body_string(handle(get("/leads/export.csv?source=Zillow&sort=BUDGET_DESC"), &state).unwrap());
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("\"Cy\""));
    assert!(lines[2].starts_with("\"Ann\""));
}

#[test]
fn export_above_row_limit_is_413() {
    let mut config = test_config();
    config.limits.max_export_rows = 1;
    let state = AppState::new(crate::tests::utils::init_test_db(), config);
    import(&state, "firstname\nA\nB");

    let err = handle(get("/leads/export.csv"), &state).expect_error();
    assert_eq!(err.status(), 413);
}

#[test]
fn xls_export_is_office_html() {
    let state = test_state();
    import(&state, "firstname,lastname\n<Ann>,Lee");

    let resp = handle(get("/leads/export.xls"), &state).unwrap();
    assert_eq!(resp.headers()["Content-Type"], "application/vnd.ms-excel");
    let body = body_string(resp);
    assert!(body.contains("urn:schemas-microsoft-com:office:excel"));
    assert!(body.contains("<td>&lt;Ann&gt;</td>"));
}

#[test]
fn xlsx_export_is_a_workbook() {
    let state = test_state();
    import(&state, "firstname,lastname\nAnn,Lee");

    let resp = handle(get("/leads/export.xlsx"), &state).unwrap();
    assert_eq!(
        resp.headers()["Content-Type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(body_bytes(resp).starts_with(b"PK"));
}

#[test]
fn exported_csv_imports_back() {
    let source = test_state();
    import(
        &source,
        "firstname,lastname,email,phone,source,status,temperature,budget\n\
         Ann,Lee,ann@x.com,5551234567,Referral,ACTIVE,HOT,725000",
    );
    let csv = body_string(handle(get("/leads/export.csv"), &source).unwrap());

    let target = test_state();
    let summary = import(&target, &csv);
    assert_eq!(summary["imported"], 1);

    let list = body_json(handle(get("/leads"), &target).unwrap());
    let lead = &list["items"][0];
    assert_eq!(lead["first_name"], "Ann");
    assert_eq!(lead["email"], "ann@x.com");
    assert_eq!(lead["phone"], "(555) 123-4567");
    assert_eq!(lead["source"], "Referral");
    assert_eq!(lead["status"], "ACTIVE");
    assert_eq!(lead["temperature"], "HOT");
    assert_eq!(lead["budget"], json!(725000));
}
