use serde_json::{Value, json};

use crate::common::{TestApp, routes};

async fn clip_type(app: &TestApp, token: &str, name: &str) -> i32 {
    let ct = app.create_content_type(token, name, &[], json!([])).await;
    ct["id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn libraries_are_listed_most_populated_first() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let ct = clip_type(&app, &token, "Clip").await;

    let empty = app.create_library(&token, "Empty", ct).await;
    let busy = app.create_library(&token, "Busy", ct).await;
    let some = app.create_library(&token, "Some", ct).await;

    app.upload_plain(&token, ct, Some(busy), "a.mp4").await;
    app.upload_plain(&token, ct, Some(busy), "b.mp4").await;
    app.upload_plain(&token, ct, Some(some), "c.mp4").await;
    app.upload_plain(&token, ct, None, "d.mp4").await;

    let res = app.get_with_token(routes::LIBRARIES, &token).await;

    assert_eq!(res.status, 200);
    let listed: Vec<(i64, i64)> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| (l["id"].as_i64().unwrap(), l["content_count"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        listed,
        vec![(busy as i64, 2), (some as i64, 1), (empty as i64, 0)]
    );
}

#[tokio::test]
async fn library_needs_an_owned_content_type() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let bobs = clip_type(&app, &bob, "Clip").await;

    let res = app
        .post_with_token(
            routes::LIBRARIES,
            &json!({"name": "Films", "content_type_id": bobs}),
            &alice,
        )
        .await;

    assert_eq!(res.status, 400);
    assert!(res.body["fields"]["content_type_id"].is_array());
}

#[tokio::test]
async fn content_can_move_between_libraries_of_its_type() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let ct = clip_type(&app, &token, "Clip").await;
    let first = app.create_library(&token, "First", ct).await;
    let second = app.create_library(&token, "Second", ct).await;
    let id = app.upload_plain(&token, ct, Some(first), "a.mp4").await;

    let res = app
        .put_with_token(
            &routes::content_library(id),
            &json!({"library_id": second}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["library_id"], second);

    let res = app
        .put_with_token(&routes::content_library(id), &json!({"library_id": null}), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["library_id"], Value::Null);
}

#[tokio::test]
async fn moving_into_a_library_of_another_type_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let clip = clip_type(&app, &token, "Clip").await;
    let song = clip_type(&app, &token, "Song").await;
    let films = app.create_library(&token, "Films", clip).await;
    let albums = app.create_library(&token, "Albums", song).await;
    let id = app.upload_plain(&token, clip, Some(films), "a.mp4").await;

    let res = app
        .put_with_token(
            &routes::content_library(id),
            &json!({"library_id": albums}),
            &token,
        )
        .await;

    assert_eq!(res.status, 409);
    let content = app.get_with_token(&routes::content(id), &token).await;
    assert_eq!(content.body["library_id"], films);
}

#[tokio::test]
async fn moving_into_someone_elses_library_is_not_found() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    let ct = clip_type(&app, &alice, "Clip").await;
    let bobs_ct = clip_type(&app, &bob, "Clip").await;
    let bobs_library = app.create_library(&bob, "Films", bobs_ct).await;
    let id = app.upload_plain(&alice, ct, None, "a.mp4").await;

    let res = app
        .put_with_token(
            &routes::content_library(id),
            &json!({"library_id": bobs_library}),
            &alice,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn deleting_a_library_keeps_its_contents() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let ct = clip_type(&app, &token, "Clip").await;
    let films = app.create_library(&token, "Films", ct).await;
    let id = app.upload_plain(&token, ct, Some(films), "a.mp4").await;

    let res = app.delete_with_token(&routes::library(films), &token).await;
    assert_eq!(res.status, 204);

    let content = app.get_with_token(&routes::content(id), &token).await;
    assert_eq!(content.status, 200);
    assert_eq!(content.body["library_id"], Value::Null);

    let list = app.get_with_token(routes::LIBRARIES, &token).await;
    assert_eq!(list.body, json!([]));
}
