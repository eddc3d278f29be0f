//! Getting documents onto disk: URL downloads and multipart uploads

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::config::DocumentsConfig;
use crate::error::{Error, Result};

/// In-progress downloads are hidden `.part` files the loader never picks up
const PARTIAL_PREFIX: &str = ".fetch-";
const PARTIAL_SUFFIX: &str = ".part";

/// Result of storing an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Bytes were written to a new file
    Saved(PathBuf),
    /// A file with that name was already present and was left untouched
    AlreadyExists(PathBuf),
}

/// The documents directory plus the HTTP client used to fill it
pub struct DocumentStore {
    dir: PathBuf,
    default_filename: String,
    http: reqwest::Client,
}

impl DocumentStore {
    /// Create the store, making sure the directory exists
    pub fn new(config: &DocumentsConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.dir)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()?;

        Ok(Self {
            dir: config.dir.clone(),
            default_filename: config.default_filename.clone(),
            http,
        })
    }

    /// Documents directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filename for a downloaded URL: its last path segment, or the default
    pub fn filename_for_url(&self, url: &reqwest::Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.last())
            .map(sanitize_filename)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.default_filename.clone())
    }

    /// Download `url` into the documents directory, overwriting any file of the same name.
    ///
    /// Each download streams into its own hidden `.part` temp file that is renamed over
    /// the target on completion. A failed download leaves nothing behind, and overlapping
    /// fetches of one URL each land a complete file.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf> {
        let url = reqwest::Url::parse(url).map_err(|e| Error::download(format!("invalid URL '{}': {}", url, e)))?;
        let path = self.dir.join(self.filename_for_url(&url));

        tracing::info!("Fetching {} -> {}", url, path.display());

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::download(e.to_string()))?;

        let (file, partial) = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(&self.dir)?
            .into_parts();

        // Dropping `partial` on an error path removes the temp file
        stream_to_file(response, tokio::fs::File::from_std(file)).await?;

        partial
            .persist(&path)
            .map_err(|e| Error::Io(e.error))?;
        tracing::info!("Saved {}", path.display());

        Ok(path)
    }

    /// Store uploaded bytes under `filename` unless a file of that name already exists
    pub async fn accept_upload(&self, filename: &str, data: &[u8]) -> Result<UploadOutcome> {
        let name = sanitize_filename(filename);
        if name.is_empty() {
            return Err(Error::InvalidUpload(format!("unusable filename '{}'", filename)));
        }

        let path = self.dir.join(&name);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::info!("{} already exists, skipping upload", path.display());
                return Ok(UploadOutcome::AlreadyExists(path));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = write_all(&mut file, data).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        tracing::info!("Saved upload {} ({} bytes)", path.display(), data.len());
        Ok(UploadOutcome::Saved(path))
    }
}

async fn write_all(file: &mut tokio::fs::File, data: &[u8]) -> Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

async fn stream_to_file(response: reqwest::Response, mut file: tokio::fs::File) -> Result<()> {
    let mut stream = response.bytes_stream();
    let mut total = 0usize;

    while let Some(bytes) = stream.next().await {
        let bytes = bytes.map_err(|e| Error::download(e.to_string()))?;
        total += bytes.len();
        file.write_all(&bytes).await?;
    }

    file.flush().await?;
    tracing::debug!("Downloaded {} bytes", total);
    Ok(())
}

/// Keep only the final path component; reject dot names
fn sanitize_filename(name: &str) -> String {
    let name = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => String::new(),
        name => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> DocumentStore {
        DocumentStore::new(&DocumentsConfig {
            dir: dir.to_path_buf(),
            ..DocumentsConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\q3.pdf"), "q3.pdf");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("dir/"), "");
    }

    #[test]
    fn test_filename_for_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let url = reqwest::Url::parse("https://example.com/reports/annual-2024.pdf?dl=1").unwrap();
        assert_eq!(store.filename_for_url(&url), "annual-2024.pdf");

        let url = reqwest::Url::parse("https://example.com/reports/").unwrap();
        assert_eq!(store.filename_for_url(&url), "downloaded_file.pdf");

        let url = reqwest::Url::parse("https://example.com").unwrap();
        assert_eq!(store.filename_for_url(&url), "downloaded_file.pdf");
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("documents");
        let store = store(&nested);
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_upload_collision_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let first = store.accept_upload("report.pdf", b"first").await.unwrap();
        assert_eq!(first, UploadOutcome::Saved(dir.path().join("report.pdf")));

        let second = store.accept_upload("report.pdf", b"second").await.unwrap();
        assert_eq!(second, UploadOutcome::AlreadyExists(dir.path().join("report.pdf")));

        assert_eq!(std::fs::read(dir.path().join("report.pdf")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).accept_upload("  ", b"data").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).fetch("not a url").await.unwrap_err();
        assert!(matches!(err, Error::Download(_)));
        assert!(err.to_string().starts_with("Download failed: "));
    }

    /// Serve `body` at `/reports/q3.pdf`, releasing responses only in pairs
    async fn serve_in_pairs(body: &'static [u8]) -> String {
        let barrier = std::sync::Arc::new(tokio::sync::Barrier::new(2));
        let router = axum::Router::new().route(
            "/reports/q3.pdf",
            axum::routing::get(move || {
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    body
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/reports/q3.pdf", addr)
    }

    #[tokio::test]
    async fn test_overlapping_fetches_of_one_url_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let url = serve_in_pairs(b"%PDF-1.4 quarterly results").await;

        for _ in 0..10 {
            let (a, b) = tokio::join!(store.fetch(&url), store.fetch(&url));
            let target = dir.path().join("q3.pdf");
            assert_eq!(a.unwrap(), target);
            assert_eq!(b.unwrap(), target);
        }

        assert_eq!(
            std::fs::read(dir.path().join("q3.pdf")).unwrap(),
            b"%PDF-1.4 quarterly results"
        );
        // No temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        // Port 1 on localhost is never listening
        let err = store.fetch("http://127.0.0.1:1/report.pdf").await.unwrap_err();
        assert!(matches!(err, Error::Download(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
