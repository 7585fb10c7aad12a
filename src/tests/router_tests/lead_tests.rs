// src/tests/router_tests/lead_tests.rs

use super::test_state;
use crate::router::{handle, AppState};
use crate::tests::utils::{body_json, get, post_json, ExpectError};
use serde_json::{json, Value};

fn create(state: &AppState, first: &str, last: &str, extra: Value) -> Value {
    let mut body = json!({
        "first_name": first,
        "last_name": last,
        "email": format!("{}@example.com", first.to_lowercase()),
        "phone": "555.010.2000",
    });
    if let (Some(obj), Some(more)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in more {
            obj.insert(k.clone(), v.clone());
        }
    }

    let resp = handle(post_json("/leads", body), state).expect("create failed");
    assert_eq!(resp.status(), 201);
    body_json(resp)
}

#[test]
fn create_then_get_round_trips() {
    let state = test_state();
    let created = create(&state, "Jane", "Doe", json!({ "budget": 500000, "tags": ["Buyer", "Buyer"] }));

    assert_eq!(created["phone"], "(555) 010-2000");
    assert_eq!(created["estimated_deal_value"], 15000);
    assert_eq!(created["tags"], json!(["Buyer"]));
    assert_eq!(created["brokerage_id"], "brk_test");
    assert_eq!(created["status"], "NEW");

    let id = created["id"].as_str().unwrap();
    let resp = handle(get(&format!("/leads/{id}")), &state).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp), created);
}

#[test]
fn create_with_missing_fields_is_400() {
    let state = test_state();
    let err = handle(post_json("/leads", json!({ "first_name": "Jane" })), &state).expect_error();
    assert_eq!(err.status(), 400);
}

#[test]
fn malformed_json_is_400() {
    let state = test_state();
    let req = crate::tests::utils::post_text("/leads", "application/json", "{not json");
    assert_eq!(handle(req, &state).expect_error().status(), 400);
}

#[test]
fn session_headers_override_owner() {
    let state = test_state();
    let req = http::Request::builder()
        .method("POST")
        .uri("/leads")
        .header("X-Brokerage-Id", "brk_7721")
        .header("X-Agent-Id", "agent_1")
        .body(astra::Body::from(
            json!({
                "first_name": "Ann", "last_name": "Lee",
                "email": "ann@x.com", "phone": "5550102000"
            })
            .to_string(),
        ))
        .unwrap();

    let lead = body_json(handle(req, &state).unwrap());
    assert_eq!(lead["brokerage_id"], "brk_7721");
    assert_eq!(lead["assigned_agent_id"], "agent_1");
}

#[test]
fn update_recomputes_deal_value_and_keeps_notes() {
    let state = test_state();
    let created = create(&state, "Jane", "Doe", json!({}));
    let id = created["id"].as_str().unwrap();

    handle(
        post_json(&format!("/leads/{id}/notes"), json!({ "author_name": "Sam", "content": "Intro call" })),
        &state,
    )
    .unwrap();

    let resp = handle(
        post_json(
            &format!("/leads/{id}"),
            json!({
                "first_name": "Jane", "last_name": "Doe-Smith",
                "email": "jane@example.com", "phone": "5550102000",
                "budget": 420000, "status": "ACTIVE"
            }),
        ),
        &state,
    )
    .unwrap();
    let updated = body_json(resp);

    assert_eq!(updated["last_name"], "Doe-Smith");
    assert_eq!(updated["estimated_deal_value"], 12600);
    assert_eq!(updated["status"], "ACTIVE");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_eq!(updated["notes"][0]["content"], "Intro call");
}

#[test]
fn stale_update_is_409() {
    let state = test_state();
    let created = create(&state, "Jane", "Doe", json!({}));
    let id = created["id"].as_str().unwrap();

    let edit = |version: &str| {
        json!({
            "first_name": "Jane", "last_name": "Doe",
            "email": "jane@example.com", "phone": "5550102000",
            "updated_at": version,
        })
    };

    let stale = "2000-01-01T00:00:00Z";
    let err = handle(post_json(&format!("/leads/{id}"), edit(stale)), &state).expect_error();
    assert_eq!(err.status(), 409);

    let current = created["updated_at"].as_str().unwrap();
    let resp = handle(post_json(&format!("/leads/{id}"), edit(current)), &state).unwrap();
    assert_eq!(resp.status(), 200);
}

#[test]
fn unknown_lead_is_404() {
    let state = test_state();
    assert_eq!(handle(get("/leads/lead_missing"), &state).expect_error().status(), 404);
    assert_eq!(
        handle(post_json("/leads/lead_missing/delete", json!({})), &state)
            .expect_error()
            .status(),
        404
    );
}

#[test]
fn delete_hides_lead_until_restored() {
    let state = test_state();
    let created = create(&state, "Jane", "Doe", json!({}));
    let id = created["id"].as_str().unwrap();

    let deleted = body_json(handle(post_json(&format!("/leads/{id}/delete"), json!({})), &state).unwrap());
    assert_eq!(deleted["is_deleted"], true);
    let first_deleted_at = deleted["deleted_at"].clone();

    // Idempotent.
    let again = body_json(handle(post_json(&format!("/leads/{id}/delete"), json!({})), &state).unwrap());
    assert_eq!(again["deleted_at"], first_deleted_at);

    assert_eq!(handle(get(&format!("/leads/{id}")), &state).expect_error().status(), 404);
    let audited = handle(get(&format!("/leads/{id}?audit=1")), &state).unwrap();
    assert_eq!(audited.status(), 200);

    let list = body_json(handle(get("/leads"), &state).unwrap());
    assert_eq!(list["total_count"], 0);

    let restored = body_json(handle(post_json(&format!("/leads/{id}/restore"), json!({})), &state).unwrap());
    assert_eq!(restored["is_deleted"], false);
    let list = body_json(handle(get("/leads"), &state).unwrap());
    assert_eq!(list["total_count"], 1);
}

#[test]
fn toggle_tag_and_set_status() {
    let state = test_state();
    let created = create(&state, "Jane", "Doe", json!({}));
    let id = created["id"].as_str().unwrap();

    let tagged = body_json(handle(post_json(&format!("/leads/{id}/tags"), json!({ "tag": "VIP" })), &state).unwrap());
    assert_eq!(tagged["tags"], json!(["VIP"]));
    let untagged = body_json(handle(post_json(&format!("/leads/{id}/tags"), json!({ "tag": "VIP" })), &state).unwrap());
    assert_eq!(untagged["tags"], json!([]));

    let moved = body_json(
        handle(post_json(&format!("/leads/{id}/status"), json!({ "status": "IN_ESCROW" })), &state).unwrap(),
    );
    assert_eq!(moved["status"], "IN_ESCROW");
}

#[test]
fn list_filters_sorts_and_paginates() {
    let state = test_state();
    for i in 0..25 {
        let source = if i % 5 == 0 { "Zillow" } else { "Website" };
        create(&state, &format!("Lead{i:02}"), "Smith", json!({ "source": source, "budget": i * 1000 }));
    }

    let page = body_json(handle(get("/leads?sort=BUDGET_DESC&page=2&page_size=10"), &state).unwrap());
    assert_eq!(page["page"], 2);
    assert_eq!(page["page_size"], 10);
    assert_eq!(page["total_pages"], 3);
    assert_eq!(page["total_count"], 25);
    assert_eq!(page["items"][0]["budget"], 14000);

    let zillow = body_json(handle(get("/leads?source=Zillow&q=lead10"), &state).unwrap());
    assert_eq!(zillow["total_count"], 1);
    assert_eq!(zillow["items"][0]["first_name"], "Lead10");

    let sources = body_json(handle(get("/sources"), &state).unwrap());
    assert_eq!(sources, json!(["Website", "Zillow"]));
}

#[test]
fn page_past_the_end_is_clamped() {
    let state = test_state();
    for i in 0..3 {
        create(&state, &format!("Lead{i}"), "Smith", json!({}));
    }
    let page = body_json(handle(get("/leads?page=9"), &state).unwrap());
    assert_eq!(page["page"], 1);
    assert_eq!(page["items"].as_array().unwrap().len(), 3);
}

#[test]
fn configured_page_size_is_the_default() {
    let mut config = crate::tests::utils::test_config();
    config.limits.default_page_size = 50;
    let state = AppState::new(crate::tests::utils::init_test_db(), config);
    for i in 0..25 {
        create(&state, &format!("Lead{i:02}"), "Smith", json!({}));
    }

    let page = body_json(handle(get("/leads"), &state).unwrap());
    assert_eq!(page["page_size"], 50);
    assert_eq!(page["items"].as_array().unwrap().len(), 25);
}

#[test]
fn unknown_sort_is_400() {
    let state = test_state();
    assert_eq!(handle(get("/leads?sort=SHOE_SIZE"), &state).expect_error().status(), 400);
}

#[test]
fn insight_falls_back_to_placeholder() {
    let state = test_state();
    let created = create(&state, "Jane", "Doe", json!({}));
    let id = created["id"].as_str().unwrap();

    let resp = handle(get(&format!("/leads/{id}/insight")), &state).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["advice"], crate::insights::PLACEHOLDER_ADVICE);
}

#[test]
fn unknown_route_is_404() {
    let state = test_state();
    assert_eq!(handle(get("/nope"), &state).expect_error().status(), 404);
}
