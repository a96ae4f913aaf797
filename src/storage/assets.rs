//! Static asset serving for the browser interface.

use axum::{body::Body, http::Request, response::Response};
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Catch-all file server rooted at the static directory.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    files: ServeDir,
}

impl StaticAssets {
    pub fn new(dir: &Path) -> Self {
        Self {
            files: ServeDir::new(dir).append_index_html_on_directories(true),
        }
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        match self.files.clone().oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        }
    }
}
