// src/tests/router_tests/bulk_tests.rs

use super::test_state;
use crate::router::{handle, AppState};
use crate::tests::utils::{body_json, get, post_json, ExpectError};
use serde_json::{json, Value};

fn seed(state: &AppState, first: &str) -> String {
    let resp = handle(
        post_json(
            "/leads",
            json!({
                "first_name": first, "last_name": "Test",
                "email": format!("{first}@example.com"), "phone": "5550001111"
            }),
        ),
        state,
    )
    .unwrap();
    body_json(resp)["id"].as_str().unwrap().to_string()
}

fn outcome_of(report: &Value, id: &str) -> String {
    report["outcomes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["id"] == id)
        .map(|o| o["outcome"].as_str().unwrap().to_string())
        .unwrap()
}

#[test]
fn bulk_tag_reports_per_id() {
    let state = test_state();
    let a = seed(&state, "ann");
    let b = seed(&state, "bo");
    handle(post_json(&format!("/leads/{b}/tags"), json!({ "tag": "Buyer" })), &state).unwrap();

    let resp = handle(
        post_json("/leads/bulk/tag", json!({ "ids": [a, b, "lead_ghost"], "tag": "Buyer" })),
        &state,
    )
    .unwrap();
    let report = body_json(resp);

    assert_eq!(outcome_of(&report, &a), "APPLIED");
    assert_eq!(outcome_of(&report, &b), "UNCHANGED");
    assert_eq!(outcome_of(&report, "lead_ghost"), "NOT_FOUND");

    let lead_b = body_json(handle(get(&format!("/leads/{b}")), &state).unwrap());
    assert_eq!(lead_b["tags"], json!(["Buyer"]));
}

#[test]
fn bulk_tag_twice_is_idempotent() {
    let state = test_state();
    let a = seed(&state, "ann");

    for _ in 0..2 {
        handle(post_json("/leads/bulk/tag", json!({ "ids": [a], "tag": "Open House" })), &state).unwrap();
    }
    let lead = body_json(handle(get(&format!("/leads/{a}")), &state).unwrap());
    assert_eq!(lead["tags"], json!(["Open House"]));
}

#[test]
fn bulk_delete_removes_from_active_views() {
    let state = test_state();
    let a = seed(&state, "ann");
    let b = seed(&state, "bo");
    seed(&state, "cy");

    let report = body_json(
        handle(post_json("/leads/bulk/delete", json!({ "ids": [a, b] })), &state).unwrap(),
    );
    assert_eq!(outcome_of(&report, &a), "APPLIED");
    assert_eq!(outcome_of(&report, &b), "APPLIED");

    let list = body_json(handle(get("/leads"), &state).unwrap());
    assert_eq!(list["total_count"], 1);
    assert_eq!(list["items"][0]["first_name"], "cy");

    // A deleted lead is out of the bulk scope.
    let again = body_json(
        handle(post_json("/leads/bulk/tag", json!({ "ids": [a], "tag": "X" })), &state).unwrap(),
    );
    assert_eq!(outcome_of(&again, &a), "NOT_FOUND");
}

#[test]
fn blank_bulk_tag_is_rejected() {
    let state = test_state();
    let a = seed(&state, "ann");
    let err = handle(post_json("/leads/bulk/tag", json!({ "ids": [a], "tag": " " })), &state)
        .expect_error();
    assert_eq!(err.status(), 400);
}
