use std::net::SocketAddr;
use std::sync::Arc;

use ::common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{Value, json};
use tempfile::TempDir;

use libcloud_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use libcloud_server::entity::{attachment, content, content_feature};
use libcloud_server::state::AppState;

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const ATTACHMENT_TYPES: &str = "/api/v1/attachment-types";
    pub const CONTENT_TYPES: &str = "/api/v1/content-types";
    pub const LIBRARIES: &str = "/api/v1/libraries";
    pub const CONTENTS: &str = "/api/v1/contents";

    pub fn attachment_type(id: i32) -> String {
        format!("{ATTACHMENT_TYPES}/{id}")
    }

    pub fn content_type(id: i32) -> String {
        format!("{CONTENT_TYPES}/{id}")
    }

    pub fn features(content_type_id: i32) -> String {
        format!("{CONTENT_TYPES}/{content_type_id}/features")
    }

    pub fn feature(content_type_id: i32, feature_id: i32) -> String {
        format!("{CONTENT_TYPES}/{content_type_id}/features/{feature_id}")
    }

    pub fn library(id: i32) -> String {
        format!("{LIBRARIES}/{id}")
    }

    pub fn content(id: i32) -> String {
        format!("{CONTENTS}/{id}")
    }

    pub fn content_file(id: i32) -> String {
        format!("{CONTENTS}/{id}/file")
    }

    pub fn content_features(id: i32) -> String {
        format!("{CONTENTS}/{id}/features")
    }

    pub fn content_library(id: i32) -> String {
        format!("{CONTENTS}/{id}/library")
    }

    pub fn attachments(content_id: i32) -> String {
        format!("{CONTENTS}/{content_id}/attachments")
    }

    pub fn attachment(content_id: i32, attachment_id: i32) -> String {
        format!("{CONTENTS}/{content_id}/attachments/{attachment_id}")
    }

    pub fn attachment_file(content_id: i32, attachment_id: i32) -> String {
        format!("{CONTENTS}/{content_id}/attachments/{attachment_id}/file")
    }

    pub fn stored_file(path: &str) -> String {
        format!("/api/v1/files/{path}")
    }
}

/// A running test server backed by a throwaway SQLite file and blob root.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub storage_root: std::path::PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub headers: reqwest::header::HeaderMap,
}

/// One part of a multipart upload.
pub enum FormField {
    Text(String, String),
    File(String, String, Vec<u8>),
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        FormField::Text(name.into(), value.to_string())
    }

    pub fn file(name: impl Into<String>, filename: impl Into<String>, bytes: &[u8]) -> Self {
        FormField::File(name.into(), filename.into(), bytes.to_vec())
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_limit(1024 * 1024).await
    }

    pub async fn spawn_with_limit(max_upload_size: u64) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let storage_root = dir.path().join("media");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
            },
            storage: StorageConfig {
                root: storage_root.clone(),
                max_upload_size,
            },
        };

        let db = libcloud_server::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize database");
        libcloud_server::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");
        libcloud_server::seed::ensure_sentinel_user(&db)
            .await
            .expect("Failed to seed sentinel user");

        let blob_store = FilesystemBlobStore::new(storage_root.clone(), max_upload_size)
            .await
            .expect("Failed to open blob store");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            blob_store: Arc::new(blob_store),
        };
        let app = libcloud_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            storage_root,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");
        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send DELETE request");
        TestResponse::from_response(res).await
    }

    pub async fn multipart_with_token(
        &self,
        path: &str,
        fields: Vec<FormField>,
        token: &str,
    ) -> TestResponse {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                FormField::Text(name, value) => form.text(name, value),
                FormField::File(name, filename, bytes) => {
                    form.part(name, Part::bytes(bytes).file_name(filename))
                }
            };
        }

        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");
        TestResponse::from_response(res).await
    }

    /// Register a user and log in, returning the auth token.
    pub async fn create_authenticated_user(&self, username: &str) -> String {
        let body = json!({"username": username, "password": "securepass"});

        let reg = self.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self.post_without_token(routes::LOGIN, &body).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Create an attachment type and return its `id`.
    pub async fn create_attachment_type(&self, token: &str, name: &str) -> i32 {
        let res = self
            .post_with_token(routes::ATTACHMENT_TYPES, &json!({"name": name}), token)
            .await;
        assert_eq!(res.status, 201, "create_attachment_type failed: {}", res.text);
        res.id()
    }

    /// Create a content type and return the full response body.
    pub async fn create_content_type(
        &self,
        token: &str,
        name: &str,
        attachment_type_ids: &[i32],
        features: Value,
    ) -> Value {
        let res = self
            .post_with_token(
                routes::CONTENT_TYPES,
                &json!({
                    "name": name,
                    "attachment_type_ids": attachment_type_ids,
                    "features": features,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_content_type failed: {}", res.text);
        res.body
    }

    /// Create a library and return its `id`.
    pub async fn create_library(&self, token: &str, name: &str, content_type_id: i32) -> i32 {
        let res = self
            .post_with_token(
                routes::LIBRARIES,
                &json!({"name": name, "content_type_id": content_type_id}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_library failed: {}", res.text);
        res.id()
    }

    /// Upload a content with no features or attachments and return its `id`.
    pub async fn upload_plain(
        &self,
        token: &str,
        content_type_id: i32,
        library_id: Option<i32>,
        filename: &'static str,
    ) -> i32 {
        let mut fields = vec![
            FormField::text("content_type_id", content_type_id),
            FormField::file("file", filename, b"payload"),
        ];
        if let Some(library_id) = library_id {
            fields.push(FormField::text("library_id", library_id));
        }
        let res = self.multipart_with_token(routes::CONTENTS, fields, token).await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.id()
    }

    pub async fn content_rows(&self) -> u64 {
        content::Entity::find().count(&self.db).await.unwrap()
    }

    pub async fn attachment_rows(&self) -> u64 {
        attachment::Entity::find().count(&self.db).await.unwrap()
    }

    pub async fn feature_value_rows(&self, content_id: i32) -> u64 {
        content_feature::Entity::find()
            .filter(content_feature::Column::ContentId.eq(content_id))
            .count(&self.db)
            .await
            .unwrap()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            headers,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Feature ids of a content type response, keyed by feature name.
pub fn feature_id(content_type: &Value, name: &str) -> i32 {
    content_type["features"]
        .as_array()
        .and_then(|features| features.iter().find(|f| f["name"] == name))
        .and_then(|f| f["id"].as_i64())
        .unwrap_or_else(|| panic!("feature {name} missing from {content_type}")) as i32
}
