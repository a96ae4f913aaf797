//! Image upload through the gateway.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::Path;

mod common;

const MIB: usize = 1024 * 1024;

fn image_form(bytes: Vec<u8>, file_name: &str, mime: &str) -> Form {
    let part = Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap();
    Form::new().part("image", part)
}

fn stored_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_upload_stores_png() {
    let root = common::temp_dir("upload-ok");
    let config = common::test_config(&root);
    let upload_dir = config.uploads.dir.clone();
    let gateway = common::spawn_gateway(config).await;

    let resp = common::client()
        .post(gateway.url("/upload"))
        .multipart(image_form(vec![7u8; 5 * MIB], "screenshot.png", "image/png"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["size"], 5 * MIB);

    let filename = body["filename"].as_str().unwrap();
    let stamp = filename
        .strip_prefix("pasted-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .unwrap();
    assert!(!stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit()));

    let path = upload_dir.join(filename);
    assert_eq!(body["path"], path.to_string_lossy().as_ref());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), (5 * MIB) as u64);
}

#[tokio::test]
async fn test_upload_without_extension_defaults_to_png() {
    let root = common::temp_dir("upload-ext");
    let gateway = common::spawn_gateway(common::test_config(&root)).await;

    let body: Value = common::client()
        .post(gateway.url("/upload"))
        .multipart(image_form(b"GIF89a".to_vec(), "clipboard", "image/gif"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["filename"].as_str().unwrap().ends_with(".png"));
}

#[tokio::test]
async fn test_oversized_upload_rejected_and_not_written() {
    let root = common::temp_dir("upload-large");
    let config = common::test_config(&root);
    let upload_dir = config.uploads.dir.clone();
    let gateway = common::spawn_gateway(config).await;

    let result = common::client()
        .post(gateway.url("/upload"))
        .multipart(image_form(vec![0u8; 11 * MIB], "big.png", "image/png"))
        .send()
        .await;

    // The gateway may answer before the client finishes sending the body.
    if let Ok(resp) = result {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Upload error: File too large");
    }
    assert_eq!(stored_files(&upload_dir), 0);
}

#[tokio::test]
async fn test_non_image_rejected() {
    let root = common::temp_dir("upload-type");
    let config = common::test_config(&root);
    let upload_dir = config.uploads.dir.clone();
    let gateway = common::spawn_gateway(config).await;

    let resp = common::client()
        .post(gateway.url("/upload"))
        .multipart(image_form(b"hello".to_vec(), "notes.txt", "text/plain"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Only image files are allowed");
    assert_eq!(stored_files(&upload_dir), 0);
}

#[tokio::test]
async fn test_missing_file_rejected() {
    let root = common::temp_dir("upload-missing");
    let gateway = common::spawn_gateway(common::test_config(&root)).await;

    let resp = common::client()
        .post(gateway.url("/upload"))
        .multipart(Form::new().text("image", "not a file"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No image file provided");
}
