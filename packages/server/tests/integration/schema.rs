use serde_json::{Value, json};

use crate::common::{FormField, TestApp, feature_id, routes};

fn features(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| json!({"name": format!("f{i}"), "kind": "String"}))
            .collect(),
    )
}

mod attachment_types {
    use super::*;

    #[tokio::test]
    async fn created_types_are_listed_oldest_first() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let subtitle = app.create_attachment_type(&token, "Subtitle").await;
        let poster = app.create_attachment_type(&token, "Poster").await;

        let res = app.get_with_token(routes::ATTACHMENT_TYPES, &token).await;

        assert_eq!(res.status, 200);
        let ids: Vec<i64> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![subtitle as i64, poster as i64]);
    }

    #[tokio::test]
    async fn blank_or_long_names_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        for name in ["   ".to_string(), "x".repeat(33)] {
            let res = app
                .post_with_token(routes::ATTACHMENT_TYPES, &json!({"name": name}), &token)
                .await;
            assert_eq!(res.status, 400, "{name:?} should be rejected");
            assert!(res.body["fields"]["name"].is_array());
        }
    }

    #[tokio::test]
    async fn other_users_types_are_invisible() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_attachment_type(&alice, "Subtitle").await;

        let list = app.get_with_token(routes::ATTACHMENT_TYPES, &bob).await;
        assert_eq!(list.body, json!([]));

        let res = app.delete_with_token(&routes::attachment_type(id), &bob).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn deleting_a_type_drops_it_from_permitted_sets() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let subtitle = app.create_attachment_type(&token, "Subtitle").await;
        let ct = app
            .create_content_type(&token, "Movie", &[subtitle], json!([]))
            .await;
        let ct_id = ct["id"].as_i64().unwrap() as i32;

        let res = app
            .delete_with_token(&routes::attachment_type(subtitle), &token)
            .await;
        assert_eq!(res.status, 204);

        let ct = app.get_with_token(&routes::content_type(ct_id), &token).await;
        assert_eq!(ct.body["attachment_types"], json!([]));
    }

    #[tokio::test]
    async fn type_in_use_by_an_attachment_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let subtitle = app.create_attachment_type(&token, "Subtitle").await;
        let ct = app
            .create_content_type(&token, "Movie", &[subtitle], json!([]))
            .await;

        let res = app
            .multipart_with_token(
                routes::CONTENTS,
                vec![
                    FormField::text("content_type_id", ct["id"].as_i64().unwrap()),
                    FormField::file("file", "movie.mp4", b"frames"),
                    FormField::file(format!("attachment.{subtitle}"), "en.srt", b"subs"),
                ],
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .delete_with_token(&routes::attachment_type(subtitle), &token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod content_types {
    use super::*;

    #[tokio::test]
    async fn type_is_created_with_schema_and_permitted_set() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let subtitle = app.create_attachment_type(&token, "Subtitle").await;

        let ct = app
            .create_content_type(
                &token,
                "Movie",
                &[subtitle],
                json!([
                    {"name": "Year", "kind": "Number", "required": true},
                    {"name": "Director", "kind": "String"},
                ]),
            )
            .await;

        assert_eq!(ct["name"], "Movie");
        assert_eq!(ct["attachment_types"][0]["id"], subtitle);
        assert_eq!(ct["features"][0]["name"], "Year");
        assert_eq!(ct["features"][0]["kind"], "Number");
        assert_eq!(ct["features"][0]["required"], true);
        assert_eq!(ct["features"][1]["required"], false);

        let fetched = app
            .get_with_token(&routes::content_type(ct["id"].as_i64().unwrap() as i32), &token)
            .await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["features"], ct["features"]);
    }

    #[tokio::test]
    async fn twenty_features_are_allowed_but_not_twenty_one() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        app.create_content_type(&token, "Twenty", &[], features(20)).await;

        let res = app
            .post_with_token(
                routes::CONTENT_TYPES,
                &json!({"name": "TooMany", "features": features(21)}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["features"].is_array());
    }

    #[tokio::test]
    async fn unknown_kind_and_duplicate_names_are_reported_per_feature() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::CONTENT_TYPES,
                &json!({
                    "name": "Movie",
                    "features": [
                        {"name": "Year", "kind": "Date"},
                        {"name": "year", "kind": "Number"},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["features.0.kind"].is_array());
        assert!(res.body["fields"]["features.1.name"].is_array());
    }

    #[tokio::test]
    async fn foreign_attachment_type_is_a_field_error() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let bobs = app.create_attachment_type(&bob, "Subtitle").await;

        let res = app
            .post_with_token(
                routes::CONTENT_TYPES,
                &json!({"name": "Movie", "attachment_type_ids": [bobs]}),
                &alice,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["attachment_type_ids"].is_array());
        let list = app.get_with_token(routes::CONTENT_TYPES, &alice).await;
        assert_eq!(list.body, json!([]));
    }

    #[tokio::test]
    async fn type_used_by_a_library_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let ct = app.create_content_type(&token, "Movie", &[], json!([])).await;
        let ct_id = ct["id"].as_i64().unwrap() as i32;
        let library = app.create_library(&token, "Films", ct_id).await;

        let res = app.delete_with_token(&routes::content_type(ct_id), &token).await;
        assert_eq!(res.status, 409);

        app.delete_with_token(&routes::library(library), &token).await;
        let res = app.delete_with_token(&routes::content_type(ct_id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::content_type(ct_id), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn type_with_content_cannot_be_deleted_until_it_is_gone() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let ct = app.create_content_type(&token, "Clip", &[], json!([])).await;
        let ct_id = ct["id"].as_i64().unwrap() as i32;
        let content = app.upload_plain(&token, ct_id, None, "clip.mp4").await;

        let res = app.delete_with_token(&routes::content_type(ct_id), &token).await;
        assert_eq!(res.status, 409);
        assert_eq!(app.content_rows().await, 1);

        app.delete_with_token(&routes::content(content), &token).await;
        let res = app.delete_with_token(&routes::content_type(ct_id), &token).await;
        assert_eq!(res.status, 204);

        let res = app
            .multipart_with_token(
                routes::CONTENTS,
                vec![
                    FormField::text("content_type_id", ct_id),
                    FormField::file("file", "late.mp4", b"frames"),
                ],
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["content_type_id"].is_array());
        assert_eq!(app.content_rows().await, 0);
    }
}

mod features {
    use super::*;

    #[tokio::test]
    async fn feature_can_be_added_until_the_cap() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let ct = app.create_content_type(&token, "Movie", &[], features(19)).await;
        let ct_id = ct["id"].as_i64().unwrap() as i32;

        let res = app
            .post_with_token(
                &routes::features(ct_id),
                &json!({"name": "Rating", "kind": "Number"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Rating");

        let res = app
            .post_with_token(
                &routes::features(ct_id),
                &json!({"name": "Extra", "kind": "Boolean"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["features"].is_array());
    }

    #[tokio::test]
    async fn required_feature_cannot_be_added_once_content_exists() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let ct = app.create_content_type(&token, "Movie", &[], json!([])).await;
        let ct_id = ct["id"].as_i64().unwrap() as i32;
        app.upload_plain(&token, ct_id, None, "movie.mp4").await;

        let required = app
            .post_with_token(
                &routes::features(ct_id),
                &json!({"name": "Year", "kind": "Number", "required": true}),
                &token,
            )
            .await;
        assert_eq!(required.status, 409);

        let optional = app
            .post_with_token(
                &routes::features(ct_id),
                &json!({"name": "Year", "kind": "Number"}),
                &token,
            )
            .await;
        assert_eq!(optional.status, 201);
    }

    #[tokio::test]
    async fn removing_a_feature_removes_its_values() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        let ct = app
            .create_content_type(
                &token,
                "Movie",
                &[],
                json!([{"name": "Director", "kind": "String"}]),
            )
            .await;
        let ct_id = ct["id"].as_i64().unwrap() as i32;
        let director = feature_id(&ct, "Director");

        let res = app
            .multipart_with_token(
                routes::CONTENTS,
                vec![
                    FormField::text("content_type_id", ct_id),
                    FormField::file("file", "movie.mp4", b"frames"),
                    FormField::text(format!("feature.{director}"), "Kubrick"),
                ],
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let content_id = res.id();
        assert_eq!(app.feature_value_rows(content_id).await, 1);

        let res = app
            .delete_with_token(&routes::feature(ct_id, director), &token)
            .await;
        assert_eq!(res.status, 204);
        assert_eq!(app.feature_value_rows(content_id).await, 0);

        let content = app.get_with_token(&routes::content(content_id), &token).await;
        assert_eq!(content.body["features"], json!([]));
    }
}
