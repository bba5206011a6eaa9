//! HTTP-level integration tests for questions, answers, votes, acceptance,
//! comments, and reputation.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get, issue_token, post_auth, post_json, post_json_auth,
    post_json_with_authorization, put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;

const ASKER: i64 = 100;
const ANSWERER: i64 = 200;
const OTHER_ANSWERER: i64 = 300;
const VOTER: i64 = 400;

async fn create_question(pool: &PgPool, author: i64) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/questions",
        json!({
            "title": "How do I register for electives?",
            "body": "The registration portal keeps rejecting my elective choices.",
            "tags": ["Registration", "electives"],
        }),
        author,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_tagged_question(pool: &PgPool, author: i64, title: &str, tags: &[&str]) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/questions",
        json!({
            "title": title,
            "body": "Asking on behalf of my whole study group this week.",
            "tags": tags,
        }),
        author,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_answer(pool: &PgPool, question_id: i64, author: i64) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/answers",
        json!({"question_id": question_id, "body": "Clear your cache and try again."}),
        author,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn reputation_of(pool: &PgPool, user_id: i64) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/users/{user_id}/reputation")).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["reputation"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_question_returns_201_with_envelope(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/questions",
        json!({
            "title": "  Where is the chemistry lab?  ",
            "body": "I cannot find room B214 on the campus map anywhere.",
            "tags": ["Chemistry", "campus", "chemistry"],
        }),
        ASKER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["id"].is_number());
    assert_eq!(data["title"], "Where is the chemistry lab?");
    assert_eq!(data["author_id"], ASKER);
    assert_eq!(data["tags"], json!(["chemistry", "campus"]));
    assert_eq!(data["vote_count"], 0);
    assert_eq!(data["upvoters"], json!([]));
    assert!(data["accepted_answer_id"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_question_without_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/questions",
        json!({"title": "Unauthenticated question", "body": "x".repeat(40)}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

fn question_body() -> serde_json::Value {
    json!({"title": "Where is the thesis template?", "body": "x".repeat(40)})
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_token_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = issue_token(ASKER, -300, &common::test_config().jwt.secret);
    let response = post_json_with_authorization(
        app,
        "/api/v1/questions",
        question_body(),
        &format!("Bearer {token}"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_from_other_signer_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = issue_token(ASKER, 900, "not-the-campus-secret");
    let response = post_json_with_authorization(
        app,
        "/api/v1/questions",
        question_body(),
        &format!("Bearer {token}"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bearer_scheme_is_case_insensitive(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::token_for(ASKER);
    let response = post_json_with_authorization(
        app,
        "/api/v1/questions",
        question_body(),
        &format!("bearer {token}"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_basic_auth_header_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_with_authorization(
        app,
        "/api/v1/questions",
        question_body(),
        "Basic c3R1ZGVudDpzZWNyZXQ=",
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_question_with_short_title_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/questions",
        json!({"title": "Short", "body": "x".repeat(40)}),
        ASKER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_nonexistent_question_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/questions/999999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_question_by_non_author_returns_403(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;

    let app = common::build_test_app(pool);
    let response = put_json_auth(
        app,
        &format!("/api/v1/questions/{question_id}"),
        json!({"title": "A hijacked question title"}),
        VOTER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_question_changes_only_given_fields(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;

    let app = common::build_test_app(pool);
    let response = put_json_auth(
        app,
        &format!("/api/v1/questions/{question_id}"),
        json!({"title": "How do I register for spring electives?"}),
        ASKER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "How do I register for spring electives?");
    assert_eq!(json["data"]["tags"], json!(["registration", "electives"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_question_returns_204_then_404(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/questions/{question_id}"), ASKER).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/questions/{question_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Votes and reputation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vote_toggle_and_reputation(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let uri = format!("/api/v1/questions/{question_id}/vote");

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, &uri, json!({"vote": "up"}), VOTER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["vote_count"], 1);
    assert_eq!(json["data"]["state"], "upvoted");
    assert_eq!(json["data"]["reputation_delta"], 10);
    assert_eq!(reputation_of(&pool, ASKER).await, 11);

    // Same direction again withdraws without taking the award back.
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, &uri, json!({"vote": "up"}), VOTER).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["vote_count"], 0);
    assert_eq!(json["data"]["state"], "none");
    assert!(json["data"]["reputation_delta"].is_null());
    assert_eq!(reputation_of(&pool, ASKER).await, 11);

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, &uri, json!({"vote": "down"}), VOTER).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["vote_count"], -1);
    assert_eq!(reputation_of(&pool, ASKER).await, 9);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/questions/{question_id}")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["downvoters"], json!([VOTER]));
    assert_eq!(json["data"]["upvoters"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_vote_value_returns_400(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/questions/{question_id}/vote"),
        json!({"vote": "sideways"}),
        VOTER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vote_on_missing_answer_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/answers/999999/vote",
        json!({"vote": "up"}),
        VOTER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_user_reports_default_reputation(pool: PgPool) {
    assert_eq!(reputation_of(&pool, 777).await, 1);
}

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_accept_by_non_author_returns_403(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let answer_id = create_answer(&pool, question_id, ANSWERER).await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/answers/{answer_id}/accept"), VOTER).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(reputation_of(&pool, ANSWERER).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_accept_switch_keeps_single_accepted_answer(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let first = create_answer(&pool, question_id, ANSWERER).await;
    let second = create_answer(&pool, question_id, OTHER_ANSWERER).await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/answers/{first}/accept"), ASKER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["accepted_answer_id"], first);

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/answers/{second}/accept"), ASKER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["accepted_answer_id"], second);

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/questions/{question_id}/answers")).await;
    let json = body_json(response).await;
    let answers = json["data"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    let accepted: Vec<i64> = answers
        .iter()
        .filter(|a| a["is_accepted"] == true)
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(accepted, vec![second]);

    // Both authors keep the award; switching never takes it back.
    assert_eq!(reputation_of(&pool, ANSWERER).await, 16);
    assert_eq!(reputation_of(&pool, OTHER_ANSWERER).await, 16);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reaccept_does_not_credit_twice(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let answer_id = create_answer(&pool, question_id, ANSWERER).await;
    let uri = format!("/api/v1/answers/{answer_id}/accept");

    for _ in 0..2 {
        let app = common::build_test_app(pool.clone());
        let response = post_auth(app, &uri, ASKER).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(reputation_of(&pool, ANSWERER).await, 16);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_accepted_answer_clears_acceptance(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let answer_id = create_answer(&pool, question_id, ANSWERER).await;

    let app = common::build_test_app(pool.clone());
    post_auth(app, &format!("/api/v1/answers/{answer_id}/accept"), ASKER).await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/answers/{answer_id}"), ANSWERER).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/questions/{question_id}")).await;
    let json = body_json(response).await;
    assert!(json["data"]["accepted_answer_id"].is_null());

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/answers/{answer_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_comments_are_appended_in_order(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let uri = format!("/api/v1/questions/{question_id}/comments");

    for (i, author) in [VOTER, ANSWERER, VOTER].into_iter().enumerate() {
        let app = common::build_test_app(pool.clone());
        let response = post_json_auth(app, &uri, json!({"text": format!("note {i}")}), author).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["position"], i as i64);
        assert_eq!(json["data"]["author_id"], author);
    }

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/questions/{question_id}")).await;
    let json = body_json(response).await;
    let texts: Vec<&str> = json["data"]["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["note 0", "note 1", "note 2"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_comment_returns_400(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let answer_id = create_answer(&pool, question_id, ANSWERER).await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        &format!("/api/v1/answers/{answer_id}/comments"),
        json!({"text": "   "}),
        VOTER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_answer_on_missing_question_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/answers",
        json!({"question_id": 999999, "body": "An answer into the void."}),
        ANSWERER,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_questions_is_newest_first_and_filters_by_tag(pool: PgPool) {
    let housing = create_tagged_question(&pool, ASKER, "Dorm move-in dates?", &["Housing"]).await;
    let library =
        create_tagged_question(&pool, ASKER, "Library hours on holidays?", &["library"]).await;
    let late = create_tagged_question(&pool, VOTER, "Late housing application?", &["housing"]).await;

    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/questions").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![late, library, housing]);

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/questions?tag=HOUSING&sort=oldest").await).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![housing, late]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_questions_hides_deleted(pool: PgPool) {
    let kept = create_question(&pool, ASKER).await;
    let gone = create_question(&pool, ASKER).await;

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/questions/{gone}"), ASKER).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/questions").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], kept);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_questions_with_unknown_sort_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/questions?sort=alphabetical").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_activity_lists_content_and_reputation(pool: PgPool) {
    let question_id = create_question(&pool, ASKER).await;
    let first = create_answer(&pool, question_id, ANSWERER).await;
    let second = create_answer(&pool, question_id, ANSWERER).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/answers/{first}/vote"),
        json!({"vote": "up"}),
        VOTER,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/users/{ANSWERER}/activity")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["user_id"], ANSWERER);
    assert_eq!(data["answer_count"], 2);
    assert_eq!(data["question_count"], 0);
    assert_eq!(data["answers"][0]["id"], second);
    assert_eq!(data["answers"][1]["id"], first);
    assert_eq!(data["reputation"], 11);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_activity_of_unknown_user_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/users/424242/activity").await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["questions"], json!([]));
    assert_eq!(data["answers"], json!([]));
    assert_eq!(data["question_count"], 0);
    assert_eq!(data["reputation"], 1);
}
