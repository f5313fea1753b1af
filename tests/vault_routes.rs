mod common;

use axum::http::StatusCode;
use common::{TestApp, spawn_app};

/// Upload as a new visitor and return the vault cookie it was given.
async fn upload_fresh(app: &TestApp, form: &str) -> String {
    let up = app.send("POST", "/vault/records", None, Some(form)).await;
    assert_eq!(up.status, StatusCode::CREATED);
    up.cookie.expect("upload should set a vault cookie")
}

#[tokio::test]
async fn upload_read_update_delete_over_http() {
    let app = spawn_app().await;
    let cookie = upload_fresh(&app, "key=k1&value=secret&confidential=true").await;
    let c = Some(cookie.as_str());

    let read = app.send("GET", "/vault/records/k1", c, None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["key"], "k1");
    assert_eq!(read.body["value"], "secret");

    let update = app
        .send("PUT", "/vault/records/k1", c, Some("value=new&confidential=false"))
        .await;
    assert_eq!(update.status, StatusCode::NO_CONTENT);
    let read = app.send("GET", "/vault/records/k1", c, None).await;
    assert_eq!(read.body["value"], "new");

    let delete = app.send("DELETE", "/vault/records/k1", c, None).await;
    assert_eq!(delete.status, StatusCode::NO_CONTENT);

    let gone = app.send("GET", "/vault/records/k1", c, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.error_code(), "NOT_FOUND");

    let again = app.send("DELETE", "/vault/records/k1", c, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn each_visitor_has_their_own_vault() {
    let app = spawn_app().await;
    let cookie = upload_fresh(&app, "key=pin&value=1234&confidential=true").await;

    let stranger = app.send("GET", "/vault/records/pin", None, None).await;
    assert_eq!(stranger.status, StatusCode::NOT_FOUND);
    assert_eq!(stranger.error_code(), "NOT_FOUND");

    let forged = app
        .send("GET", "/vault/records/pin", Some("desk_vault=guessed"), None)
        .await;
    assert_eq!(forged.status, StatusCode::NOT_FOUND);

    // The stranger can reuse the key without touching the owner's value.
    let other = upload_fresh(&app, "key=pin&value=0000").await;
    assert_ne!(other, cookie);

    let owner = app
        .send("GET", "/vault/records/pin", Some(&cookie), None)
        .await;
    assert_eq!(owner.body["value"], "1234");

    let report = app.send("GET", "/vault/usage", None, None).await;
    assert_eq!(report.body["step"], "startup");
    assert_eq!(report.body["records"], 0);
}

#[tokio::test]
async fn duplicate_upload_is_a_conflict() {
    let app = spawn_app().await;
    let cookie = upload_fresh(&app, "key=k&value=a").await;
    let c = Some(cookie.as_str());

    let second = app
        .send("POST", "/vault/records", c, Some("key=k&value=b&confidential=true"))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), "DUPLICATE_KEY");

    let read = app.send("GET", "/vault/records/k", c, None).await;
    assert_eq!(read.body["value"], "a");
}

#[tokio::test]
async fn update_of_missing_key_is_not_found() {
    let app = spawn_app().await;
    let reply = app
        .send("PUT", "/vault/records/nope", None, Some("value=v"))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn html_checkbox_marks_the_value_confidential() {
    let app = spawn_app().await;
    let cookie = upload_fresh(&app, "key=k&value=v&confidential=on").await;

    let report = app.send("GET", "/vault/usage", Some(&cookie), None).await;
    assert_eq!(report.body["top_entries"][0]["key"], "k");
    assert_eq!(report.body["top_entries"][0]["is_confidential"], true);

    let read = app.send("GET", "/vault/records/k", Some(&cookie), None).await;
    assert_eq!(read.body["value"], "v");
}

#[tokio::test]
async fn bad_forms_get_the_json_error_body() {
    let app = spawn_app().await;

    let missing = app
        .send("POST", "/vault/records", None, Some("key=k"))
        .await;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(missing.error_code(), "INVALID_FORM");

    let checkbox = app
        .send(
            "POST",
            "/vault/records",
            None,
            Some("key=k&value=v&confidential=maybe"),
        )
        .await;
    assert_eq!(checkbox.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(checkbox.error_code(), "INVALID_FORM");

    let no_body = app.send("POST", "/vault/records", None, None).await;
    assert!(no_body.status.is_client_error());
    assert_eq!(no_body.error_code(), "INVALID_FORM");
}

#[tokio::test]
async fn usage_report_follows_the_last_step() {
    let app = spawn_app().await;

    let start = app.send("GET", "/vault", None, None).await;
    assert_eq!(start.status, StatusCode::OK);
    assert_eq!(start.body["step"], "startup");
    assert_eq!(start.body["records"], 0);
    let cookie = start.cookie.expect("report should set a vault cookie");
    let c = Some(cookie.as_str());

    app.send(
        "POST",
        "/vault/records",
        c,
        Some("key=big&value=0123456789&confidential=true"),
    )
    .await;
    app.send("POST", "/vault/records", c, Some("key=small&value=x"))
        .await;

    let report = app.send("GET", "/vault/usage", c, None).await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.body["step"], "upload");
    assert_eq!(report.body["records"], 2);
    assert_eq!(report.body["records_diff"], 2);
    assert_eq!(report.body["top_entries"][0]["key"], "big");
    assert_eq!(report.body["top_entries"][0]["is_confidential"], true);
    assert!(report.body["process"]["user_cpu_secs"].is_number());
    assert!(report.body["heap_diff"].is_object());

    let read = app.send("GET", "/vault/records/missing", c, None).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);
    let after_read = app.send("GET", "/vault/usage", c, None).await;
    assert_eq!(after_read.body["step"], "read");
    assert_eq!(after_read.body["records_diff"], 0);
}
