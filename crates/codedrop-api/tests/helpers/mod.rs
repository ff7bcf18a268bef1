//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p codedrop-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use codedrop_api::setup::{self, routes};
use codedrop_api::state::AppState;
use codedrop_core::Config;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Test application: server, shared state and the content area it owns.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub content_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Number of objects currently held in the content area.
    pub fn stored_object_count(&self) -> usize {
        let objects: PathBuf = self.content_dir.path().join("objects");
        std::fs::read_dir(objects)
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }

    /// Wait for background release of consumed content.
    pub async fn wait_for_empty_content_area(&self) -> bool {
        for _ in 0..100 {
            if self.stored_object_count() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Setup test app with default limits.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Setup test app, overriding configuration variables.
pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let content_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let mut vars: HashMap<String, String> = HashMap::from([(
        "CONTENT_DIR".to_string(),
        content_dir.path().display().to_string(),
    )]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    let config = Config::from_source(|key| vars.get(key).cloned()).expect("Invalid test config");

    let state = setup::build_state(&config)
        .await
        .expect("Failed to build state");
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        content_dir,
    }
}

/// One file part under the `file` field.
pub fn file_part(name: &str, mime_type: &str, data: &[u8]) -> Part {
    Part::bytes(data.to_vec())
        .file_name(name.to_string())
        .mime_type(mime_type.to_string())
}

/// Upload text `files` (name, contents) in one request and return the issued code.
pub async fn upload_files(client: &TestServer, files: &[(&str, &str)]) -> String {
    let mut form = MultipartForm::new();
    for (name, data) in files {
        form = form.add_part("file", file_part(name, "text/plain", data.as_bytes()));
    }

    let response = client.post("/upload").multipart(form).await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    body["code"]
        .as_str()
        .expect("Expected 'code' in upload response")
        .to_string()
}
