use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use libcloud_server::entity::{content, content_type, library, user};

use crate::common::{TestApp, routes};

#[tokio::test]
async fn deleted_account_hands_everything_to_the_placeholder() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let ct = app.create_content_type(&token, "Clip", &[], json!([])).await;
    let ct_id = ct["id"].as_i64().unwrap() as i32;
    let films = app.create_library(&token, "Films", ct_id).await;
    let id = app.upload_plain(&token, ct_id, Some(films), "a.mp4").await;

    let res = app.delete_with_token(routes::ME, &token).await;
    assert_eq!(res.status, 204);

    let sentinel = user::Entity::find()
        .filter(user::Column::Username.eq("deleted"))
        .one(&app.db)
        .await
        .unwrap()
        .expect("placeholder account should exist");
    let alice = user::Entity::find()
        .filter(user::Column::Username.eq("alice"))
        .one(&app.db)
        .await
        .unwrap();
    assert!(alice.is_none());

    let kept = content::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("content should survive its creator");
    assert_eq!(kept.creator_id, sentinel.id);
    assert_eq!(kept.library_id, Some(films));
    assert_eq!(kept.path, "user_alice/a.mp4");
    assert!(app.storage_root.join("user_alice/a.mp4").is_file());

    let ct = content_type::Entity::find_by_id(ct_id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(ct.user_id, sentinel.id);
    let lib = library::Entity::find_by_id(films).one(&app.db).await.unwrap().unwrap();
    assert_eq!(lib.user_id, sentinel.id);
}

#[tokio::test]
async fn token_of_a_deleted_account_stops_working() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;

    let res = app.delete_with_token(routes::ME, &token).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(routes::ME, &token).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn reused_username_does_not_see_the_old_rows() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice").await;
    let ct = app.create_content_type(&token, "Clip", &[], json!([])).await;
    app.upload_plain(&token, ct["id"].as_i64().unwrap() as i32, None, "a.mp4")
        .await;
    app.delete_with_token(routes::ME, &token).await;

    let token = app.create_authenticated_user("alice").await;

    let contents = app.get_with_token(routes::CONTENTS, &token).await;
    assert_eq!(contents.body, json!([]));
    let types = app.get_with_token(routes::CONTENT_TYPES, &token).await;
    assert_eq!(types.body, json!([]));
}
