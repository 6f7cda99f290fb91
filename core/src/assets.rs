//! Publishes the static web client to an object store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

use crate::error::ServiceError;
use crate::services::http_client;
use crate::signing::RequestAuth;

/// The one script whose API base URL is rewritten on upload.
pub const PATCHED_SCRIPT: &str = "app.js";

/// Base URLs baked into the client that get replaced with the live API URL.
pub const PLACEHOLDER_BASE_URLS: [&str; 2] = [
    "http://127.0.0.1:3000",
    "https://njbbl68078.execute-api.us-east-1.amazonaws.com/Prod",
];

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("js", "application/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const OBJECT_STORE: &str = "object store";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("web directory not found at {0}")]
    MissingDirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{0} is not valid UTF-8")]
    NotUtf8(PathBuf),

    #[error("failed to store {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: ServiceError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Content type by (case-insensitive) extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    ext.and_then(|ext| {
        CONTENT_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, content_type)| *content_type)
    })
    .unwrap_or(DEFAULT_CONTENT_TYPE)
}

pub fn patch_api_base_url(content: &str, api_url: &str) -> String {
    PLACEHOLDER_BASE_URLS
        .iter()
        .fold(content.to_string(), |acc, placeholder| acc.replace(placeholder, api_url))
}

/// Destination for published files, keyed by relative path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AssetError>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}

/// Uploads with `PUT {bucket_url}/{key}`.
pub struct HttpObjectStore {
    http: reqwest::Client,
    bucket_url: String,
    auth: RequestAuth,
}

impl HttpObjectStore {
    /// For S3 pass a [`RequestAuth::SigV4`] signer built
    /// `with_payload_checksum`.
    pub fn new(bucket_url: impl Into<String>, auth: RequestAuth) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client()?,
            bucket_url: bucket_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AssetError> {
        let store_err = |source: ServiceError| AssetError::Store {
            key: key.to_string(),
            source,
        };

        let request = self
            .http
            .put(format!("{}/{}", self.bucket_url, key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .build()
            .map_err(|e| store_err(ServiceError::transport(OBJECT_STORE, e)))?;
        let request = self
            .auth
            .authorize(OBJECT_STORE, request)
            .map_err(store_err)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| store_err(ServiceError::transport(OBJECT_STORE, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(store_err(ServiceError::Status {
                service: OBJECT_STORE,
                status: status.as_u16(),
                body,
            }));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.bucket_url, self.auth.describe())
    }
}

/// Writes files under a local directory, mirroring the key layout.
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for DirectoryStore {
    async fn put(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<(), AssetError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AssetError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| AssetError::Write { path, source })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Uploads every file under `web_dir`, keyed by its `/`-separated relative
/// path. Returns the number of files uploaded.
pub async fn publish_directory(
    web_dir: &Path,
    store: &dyn ObjectStore,
    api_url: Option<&str>,
) -> Result<usize, AssetError> {
    if !web_dir.is_dir() {
        return Err(AssetError::MissingDirectory(web_dir.to_path_buf()));
    }
    let api_url = api_url.map(|url| url.trim_end_matches('/'));

    let mut count = 0;
    for entry in WalkDir::new(web_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let key = object_key(web_dir, path);
        let content_type = content_type_for(path);

        let mut body = tokio::fs::read(path)
            .await
            .map_err(|source| AssetError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(api_url) = api_url {
            if entry.file_name() == PATCHED_SCRIPT {
                let text = String::from_utf8(body)
                    .map_err(|_| AssetError::NotUtf8(path.to_path_buf()))?;
                body = patch_api_base_url(&text, api_url).into_bytes();
            }
        }

        info!("  Uploading {}  ({})", key, content_type);
        store.put(&key, body, content_type).await?;
        count += 1;
    }

    info!("{} file(s) uploaded to {}", count, store.describe());
    Ok(count)
}

fn object_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        puts: Mutex<Vec<(String, Vec<u8>, String)>>,
    }

    #[async_trait]
    impl ObjectStore for Recorder {
        async fn put(
            &self,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), AssetError> {
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), body, content_type.to_string()));
            Ok(())
        }

        fn describe(&self) -> String {
            "recorder".into()
        }
    }

    fn web_fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        fs::write(
            dir.path().join("app.js"),
            "const API_BASE_URL = 'http://127.0.0.1:3000';",
        )
        .unwrap();
        fs::write(
            dir.path().join("js/config.js"),
            "return 'http://127.0.0.1:3000';",
        )
        .unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("logo.PNG"), [0x89, 0x50]).unwrap();
        dir
    }

    #[test]
    fn content_types_follow_table() {
        assert_eq!(content_type_for(Path::new("a/index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("x.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("fav.ico")), "image/x-icon");
        assert_eq!(content_type_for(Path::new("notes.txt")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("Makefile")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn both_placeholders_are_replaced() {
        let patched = patch_api_base_url(
            "a=http://127.0.0.1:3000; b=https://njbbl68078.execute-api.us-east-1.amazonaws.com/Prod/chat",
            "https://api.example.com",
        );
        assert_eq!(patched, "a=https://api.example.com; b=https://api.example.com/chat");
    }

    #[tokio::test]
    async fn publishes_every_file_and_patches_only_app_js() {
        let dir = web_fixture();
        let store = Recorder::default();

        let count = publish_directory(dir.path(), &store, Some("https://api.example.com/"))
            .await
            .unwrap();
        assert_eq!(count, 4);

        let puts = store.puts.lock().unwrap();
        let keys: Vec<&str> = puts.iter().map(|(k, _, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["app.js", "index.html", "js/config.js", "logo.PNG"]);

        let (_, app, app_type) = &puts[0];
        assert_eq!(app_type, "application/javascript");
        assert_eq!(
            String::from_utf8_lossy(app),
            "const API_BASE_URL = 'https://api.example.com';"
        );

        let (_, config, _) = &puts[2];
        assert_eq!(String::from_utf8_lossy(config), "return 'http://127.0.0.1:3000';");
        assert_eq!(puts[3].2, "image/png");
    }

    #[tokio::test]
    async fn no_api_url_means_no_patch() {
        let dir = web_fixture();
        let out = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(out.path());

        publish_directory(dir.path(), &store, None).await.unwrap();

        let app = fs::read_to_string(out.path().join("app.js")).unwrap();
        assert!(app.contains("http://127.0.0.1:3000"));
        assert!(out.path().join("js/config.js").exists());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let err = publish_directory(Path::new("/definitely/not/here"), &Recorder::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::MissingDirectory(_)));
    }
}
