//! Integration tests for the narrative routes, driven through the full router.

mod common;

use axum::http::StatusCode;
use diana_core::model::{ClueId, Fragment, FragmentId, UserId};
use diana_test_support::{ChoiceBuilder, FragmentBuilder};

/// F1 --enter (10 pts, clue_a)--> F2 --finish--> end; F1 --leave--> end;
/// F3 requires clue_b, which nothing in this story unlocks.
fn story() -> Vec<Fragment> {
    vec![
        FragmentBuilder::new("f1")
            .choice(
                ChoiceBuilder::new("enter", "Enter")
                    .reward(10)
                    .next("f2")
                    .unlocks("clue_a")
                    .build(),
            )
            .choice(ChoiceBuilder::new("leave", "Leave").build())
            .build(),
        FragmentBuilder::new("f2")
            .created_minutes_after(1)
            .choice(ChoiceBuilder::new("finish", "Finish").build())
            .build(),
        FragmentBuilder::new("f3")
            .created_minutes_after(2)
            .requires("clue_b")
            .build(),
    ]
}

#[tokio::test]
async fn test_new_user_walks_the_story_to_the_end() {
    // Arrange
    let (app, stores) = common::build_test_app(story());

    // Act: enter
    let (status, json) =
        common::get_json(app.clone(), "/api/v1/narrative/users/42/current").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fragment_id"], "f1");

    // Act: choose "enter"
    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/narrative/users/42/choices",
        &serde_json::json!({ "fragment_id": "f1", "choice_index": 0 }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["next"]["fragment_id"], "f2");
    assert_eq!(stores.rewards.grants().len(), 1);

    // Act: the user is now on F2
    let (status, json) =
        common::get_json(app.clone(), "/api/v1/narrative/users/42/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fragment_id"], "f2");

    // Act: finish
    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/narrative/users/42/choices",
        &serde_json::json!({ "fragment_id": "f2", "choice_id": "finish" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["end_of_branch"], true);

    // Assert: progress and history
    let (status, json) = common::get_json(app.clone(), "/api/v1/narrative/users/42/progress").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed_fragments"], serde_json::json!(["f1", "f2"]));
    assert!(json["current_fragment_id"].is_null());

    let (status, json) =
        common::get_json(app, "/api/v1/narrative/users/42/decisions?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["choice_id"], "finish");

    let state = stores.progression.state(UserId(42)).unwrap();
    assert!(state.has_clue(&ClueId::from("clue_a")));
    assert_eq!(state.current_fragment_id, None);
}

#[tokio::test]
async fn test_reentry_after_end_of_branch_returns_entry_fragment() {
    // Arrange
    let (app, stores) = common::build_test_app(story());
    common::post_json(
        app.clone(),
        "/api/v1/narrative/users/5/choices",
        &serde_json::json!({ "fragment_id": "f1", "choice_id": "leave" }),
    )
    .await;

    // Act
    let (status, json) = common::get_json(app, "/api/v1/narrative/users/5/current").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fragment_id"], "f1");
    assert_eq!(
        stores.progression.state(UserId(5)).unwrap().current_fragment_id,
        Some(FragmentId::from("f1"))
    );
}

#[tokio::test]
async fn test_gated_fragment_stays_closed_without_clue() {
    let (app, _) = common::build_test_app(story());
    common::post_json(
        app.clone(),
        "/api/v1/narrative/users/9/choices",
        &serde_json::json!({ "fragment_id": "f1", "choice_id": "enter" }),
    )
    .await;

    let (status, json) =
        common::get_json(app, "/api/v1/narrative/users/9/requirements/f3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["met"], false);
    assert_eq!(json["missing"], serde_json::json!(["clue_b"]));
}

#[tokio::test]
async fn test_invalid_choice_leaves_no_trace() {
    // Arrange
    let (app, stores) = common::build_test_app(story());

    // Act
    let (status, json) = common::post_json(
        app,
        "/api/v1/narrative/users/11/choices",
        &serde_json::json!({ "fragment_id": "f1", "choice_index": 5 }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_choice");
    assert!(stores.progression.state(UserId(11)).is_none());
    assert!(stores.progression.decisions().is_empty());
}
