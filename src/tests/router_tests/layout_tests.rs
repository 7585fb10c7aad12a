// src/tests/router_tests/layout_tests.rs

use super::test_state;
use crate::router::handle;
use crate::tests::utils::{body_json, get, post_json, ExpectError};
use serde_json::json;

#[test]
fn default_layout_for_new_user() {
    let state = test_state();
    let layout = body_json(handle(get("/layout"), &state).unwrap());

    assert_eq!(layout["column_order"][0], "SELECT");
    assert_eq!(layout["column_order"].as_array().unwrap().len(), 10);
    assert_eq!(
        layout["status_tab_order"],
        json!(["ALL", "NEW", "CONTACTED", "ACTIVE", "IN_ESCROW", "CLOSED"])
    );
    assert_eq!(layout["hidden_columns"], json!([]));
}

#[test]
fn column_move_persists_and_select_stays_pinned() {
    let state = test_state();

    let moved = body_json(
        handle(post_json("/layout/columns/move", json!({ "from": 9, "to": 1 })), &state).unwrap(),
    );
    assert_eq!(moved["column_order"][1], "CREATED");

    let pinned = body_json(
        handle(post_json("/layout/columns/move", json!({ "from": 0, "to": 3 })), &state).unwrap(),
    );
    assert_eq!(pinned["column_order"], moved["column_order"]);

    let reloaded = body_json(handle(get("/layout"), &state).unwrap());
    assert_eq!(reloaded["column_order"][1], "CREATED");
}

#[test]
fn tab_move_and_reset() {
    let state = test_state();
    let moved = body_json(
        handle(post_json("/layout/tabs/move", json!({ "from": 0, "to": 5 })), &state).unwrap(),
    );
    assert_eq!(moved["status_tab_order"][5], "ALL");

    let reset = body_json(handle(post_json("/layout/reset", json!({})), &state).unwrap());
    assert_eq!(reset["status_tab_order"][0], "ALL");
}

#[test]
fn layouts_are_per_user() {
    let state = test_state();
    let req = http::Request::builder()
        .method("POST")
        .uri("/layout/tabs/move")
        .header("X-User-Id", "user_other")
        .body(astra::Body::from(json!({ "from": 1, "to": 2 }).to_string()))
        .unwrap();
    handle(req, &state).unwrap();

    let mine = body_json(handle(get("/layout"), &state).unwrap());
    assert_eq!(mine["status_tab_order"][1], "NEW");
}

#[test]
fn replacing_layout_validates_permutations() {
    let state = test_state();
    let mut layout = body_json(handle(get("/layout"), &state).unwrap());
    layout["hidden_columns"] = json!(["SELECT", "BUDGET"]);

    let saved = body_json(handle(post_json("/layout", layout.clone()), &state).unwrap());
    assert_eq!(saved["hidden_columns"], json!(["SELECT", "BUDGET"]));

    layout["column_order"] = json!(["NAME", "NAME"]);
    let err = handle(post_json("/layout", layout), &state).expect_error();
    assert_eq!(err.status(), 400);
}

#[test]
fn replacing_layout_requires_select_first() {
    let state = test_state();
    let mut layout = body_json(handle(get("/layout"), &state).unwrap());
    let columns = layout["column_order"].as_array_mut().unwrap();
    columns.swap(0, 4);

    let err = handle(post_json("/layout", layout), &state).expect_error();
    assert_eq!(err.status(), 400);

    let reloaded = body_json(handle(get("/layout"), &state).unwrap());
    assert_eq!(reloaded["column_order"][0], "SELECT");
}
