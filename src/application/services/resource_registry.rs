//! Resource registry - deduplicated backups of externally referenced assets
//!
//! Every asset URL found during traversal is registered here. The registry
//! keeps one request per distinct URL, records every place the URL was
//! referenced, and performs the actual fetch lazily during the sink flush.
//! A URL is downloaded at most once per run; further output paths for the
//! same URL receive a local copy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Url;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::application::ports::outbound::ResourceFetchPort;
use crate::infrastructure::atomic_write::{ensure_parent_dir, with_suffix};

/// Whether `value` is an absolute URL with a host
pub fn is_url(value: &str) -> bool {
    Url::parse(value).map(|url| url.has_host()).unwrap_or(false)
}

/// Where a registered resource will be materialized
///
/// `stem` is the project-relative path without extension; the extension is
/// resolved during flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredPath {
    pub url: String,
    pub stem: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FetchState {
    Pending,
    /// Available locally at this path (downloaded this run or already on disk)
    Available(PathBuf),
    Failed(String),
}

/// One external URL to back up
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    extension_hint: Option<String>,
    fallback_extension: Option<String>,
    /// `Some` once resolution ran; the inner `None` means no extension at all
    resolved_extension: Option<Option<String>>,
    state: FetchState,
}

impl ResourceRequest {
    fn new(extension_hint: Option<&str>, fallback_extension: Option<&str>) -> Self {
        Self {
            extension_hint: extension_hint.map(str::to_string),
            fallback_extension: fallback_extension.map(str::to_string),
            resolved_extension: None,
            state: FetchState::Pending,
        }
    }

    /// Extension chosen during flush, if resolution already ran
    pub fn resolved_extension(&self) -> Option<&str> {
        self.resolved_extension.as_ref().and_then(|ext| ext.as_deref())
    }
}

#[derive(Debug, Clone)]
struct Provenance {
    owner: String,
    stem: String,
}

/// Result of materializing one resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    /// Same URL was already downloaded this run; copied locally
    Copied,
    /// Destination already existed
    Skipped,
    Failed(String),
}

/// Registry of every external resource referenced during one export run
pub struct ResourceRegistry {
    requests: IndexMap<String, ResourceRequest>,
    provenance: IndexMap<String, Vec<Provenance>>,
    fetch_delay: Duration,
}

impl ResourceRegistry {
    pub fn new(fetch_delay: Duration) -> Self {
        Self {
            requests: IndexMap::new(),
            provenance: IndexMap::new(),
            fetch_delay,
        }
    }

    /// Register a reference to `url` made by `owner`
    ///
    /// Creates the request on first sight of the URL and reuses it afterwards.
    /// `path_builder` chooses the extension-less output path for this
    /// reference; the reference is logged in the provenance report either way.
    pub fn register<F>(
        &mut self,
        owner: &str,
        url: &str,
        path_builder: F,
        extension_hint: Option<&str>,
        fallback_extension: Option<&str>,
    ) -> RegisteredPath
    where
        F: FnOnce(&ResourceRequest) -> String,
    {
        let request = self.requests.entry(url.to_string()).or_insert_with(|| {
            debug!(url = %url, "New resource request");
            ResourceRequest::new(extension_hint, fallback_extension)
        });
        let stem = path_builder(request);

        self.provenance
            .entry(url.to_string())
            .or_default()
            .push(Provenance {
                owner: owner.to_string(),
                stem: stem.clone(),
            });

        RegisteredPath {
            url: url.to_string(),
            stem,
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn get(&self, url: &str) -> Option<&ResourceRequest> {
        self.requests.get(url)
    }

    /// Resolve the extension of every registered URL
    pub async fn resolve_all(&mut self, base: &Path, fetcher: &dyn ResourceFetchPort) {
        let urls: Vec<String> = self.requests.keys().cloned().collect();
        for url in urls {
            self.resolve_extension(&url, base, fetcher).await;
        }
    }

    /// Resolve (once) the file extension for `url`
    ///
    /// Order: explicit hint, the URL's own suffix, a copy an earlier run left
    /// under `base` at one of the URL's paths, the server's content type,
    /// then the caller's fallback. The result is cached on the request.
    pub async fn resolve_extension(
        &mut self,
        url: &str,
        base: &Path,
        fetcher: &dyn ResourceFetchPort,
    ) -> Option<String> {
        let request = self.requests.get(url)?;
        if let Some(resolved) = &request.resolved_extension {
            return resolved.clone();
        }
        let fallback = request.fallback_extension.clone();

        let mut extension = request
            .extension_hint
            .clone()
            .or_else(|| extension_from_url(url));

        if extension.is_none() {
            extension = self.extension_on_disk(url, base).await;
        }

        if extension.is_none() {
            extension = match fetcher.probe_content_type(url).await {
                Ok(Some(content_type)) => extension_for_content_type(&content_type),
                Ok(None) => None,
                Err(e) => {
                    warn!(url = %url, error = %e, "Content type probe failed");
                    None
                }
            };
        }

        let extension = extension.or(fallback);
        if extension.is_none() {
            warn!(url = %url, "No extension could be determined");
        }

        if let Some(request) = self.requests.get_mut(url) {
            request.resolved_extension = Some(extension.clone());
        }
        extension
    }

    /// Extension of a file named `<stem>.<ext>` already present for `url`
    async fn extension_on_disk(&self, url: &str, base: &Path) -> Option<String> {
        for reference in self.provenance.get(url)? {
            let target = base.join(&reference.stem);
            let (Some(dir), Some(name)) = (target.parent(), target.file_name()) else {
                continue;
            };
            let Some(prefix) = name.to_str().map(|name| format!("{name}.")) else {
                continue;
            };
            let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
                continue;
            };

            while let Ok(Some(entry)) = entries.next_entry().await {
                let file_name = entry.file_name();
                let Some(ext) = file_name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
                    continue;
                };
                if ext.is_empty() || ext.contains('.') || ext == "part" || ext == "tmp" {
                    continue;
                }
                if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                    debug!(url = %url, path = %entry.path().display(), "Extension taken from existing copy");
                    return Some(format!(".{ext}"));
                }
            }
        }
        None
    }

    /// Materialize `url` at `dest`
    ///
    /// Skips destinations that already exist. The first missing destination
    /// of a URL triggers the single download (after the politeness delay);
    /// later ones copy that file. A failed URL is not retried in the same run.
    pub async fn fetch(
        &mut self,
        url: &str,
        dest: &Path,
        fetcher: &dyn ResourceFetchPort,
    ) -> FetchOutcome {
        let fetch_delay = self.fetch_delay;
        let Some(request) = self.requests.get_mut(url) else {
            return FetchOutcome::Failed(format!("Unregistered resource: {url}"));
        };

        let present = tokio::fs::metadata(dest)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if present {
            debug!(path = %dest.display(), "Resource already present, skipping");
            if request.state == FetchState::Pending {
                request.state = FetchState::Available(dest.to_path_buf());
            }
            return FetchOutcome::Skipped;
        }

        if let Err(e) = ensure_parent_dir(dest).await {
            return FetchOutcome::Failed(e.to_string());
        }
        let part_path = with_suffix(dest, ".part");

        match request.state.clone() {
            FetchState::Failed(error) => FetchOutcome::Failed(error),
            FetchState::Available(source) => {
                let copied = match tokio::fs::copy(&source, &part_path).await {
                    Ok(_) => tokio::fs::rename(&part_path, dest).await,
                    Err(e) => Err(e),
                };
                match copied {
                    Ok(()) => FetchOutcome::Copied,
                    Err(e) => {
                        let _ = tokio::fs::remove_file(&part_path).await;
                        FetchOutcome::Failed(e.to_string())
                    }
                }
            }
            FetchState::Pending => {
                tokio::time::sleep(fetch_delay).await;
                info!(url = %url, path = %dest.display(), "Downloading resource");

                let result = match fetcher.download(url, &part_path).await {
                    Ok(bytes) => tokio::fs::rename(&part_path, dest)
                        .await
                        .map(|()| bytes)
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };

                match result {
                    Ok(bytes) => {
                        request.state = FetchState::Available(dest.to_path_buf());
                        FetchOutcome::Downloaded { bytes }
                    }
                    Err(error) => {
                        warn!(url = %url, error = %error, "Resource download failed");
                        let _ = tokio::fs::remove_file(&part_path).await;
                        request.state = FetchState::Failed(error.clone());
                        FetchOutcome::Failed(error)
                    }
                }
            }
        }
    }

    /// Provenance log: `{ url: [[owner, path], ...] }`
    ///
    /// Paths carry their resolved extension when resolution already ran.
    pub fn provenance_report(&self) -> Value {
        let mut report = Map::new();
        for (url, references) in &self.provenance {
            let extension = self
                .requests
                .get(url)
                .and_then(ResourceRequest::resolved_extension)
                .unwrap_or("");
            let entries = references
                .iter()
                .map(|r| json!([r.owner, format!("{}{}", r.stem, extension)]))
                .collect();
            report.insert(url.clone(), Value::Array(entries));
        }
        Value::Object(report)
    }
}

/// Extension taken from the URL path when it names a known file type
fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let file_name = parsed.path_segments()?.next_back()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || mime_guess::from_ext(ext).first().is_none() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Extension for a `Content-Type` header value
fn extension_for_content_type(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let preferred = match essence.as_str() {
        "application/octet-stream" => Some("bin"),
        "text/plain" => Some("txt"),
        "image/jpeg" => Some("jpg"),
        _ => None,
    };
    if let Some(ext) = preferred {
        return Some(format!(".{ext}"));
    }

    let extensions = mime_guess::get_mime_extensions_str(&essence)?;
    let subtype = essence.rsplit('/').next().unwrap_or("");
    let ext = extensions
        .iter()
        .find(|ext| **ext == subtype)
        .or_else(|| extensions.first())?;
    Some(format!(".{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::fake::FakeFetcher;
    use tempfile::TempDir;

    const FACE: &str = "http://cloud.example.com/ugc/123/FACE/";
    const NO_BASE: &str = "/nonexistent/project";

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new(Duration::ZERO)
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("http://example.com/a.png"));
        assert!(is_url("https://steamusercontent.com/ugc/1/ABC/"));
        assert!(!is_url("not a url"));
        assert!(!is_url("file:///tmp/a.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_register_dedups_and_logs_every_reference() {
        let mut registry = registry();
        let first = registry.register("g1", FACE, |_| "bin/CustomDeck/1-FaceURL".into(), None, None);
        let second = registry.register("g2", FACE, |_| "bin/CustomDeck/2-FaceURL".into(), None, None);

        assert_eq!(registry.len(), 1);
        assert_eq!(first.url, second.url);
        assert_ne!(first.stem, second.stem);

        let report = registry.provenance_report();
        assert_eq!(
            report[FACE],
            json!([["g1", "bin/CustomDeck/1-FaceURL"], ["g2", "bin/CustomDeck/2-FaceURL"]])
        );
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("http://x.com/a/table.PNG"), Some(".png".into()));
        assert_eq!(extension_from_url("http://x.com/a/rules.pdf?dl=1"), Some(".pdf".into()));
        assert_eq!(extension_from_url(FACE), None);
        assert_eq!(extension_from_url("http://x.com/a/file.notarealext"), None);
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/png"), Some(".png".into()));
        assert_eq!(extension_for_content_type("image/jpeg; charset=binary"), Some(".jpg".into()));
        assert_eq!(extension_for_content_type("application/octet-stream"), Some(".bin".into()));
        assert_eq!(extension_for_content_type("application/x-not-a-type"), None);
    }

    #[tokio::test]
    async fn test_resolution_order_and_caching() {
        let fetcher = FakeFetcher::new().with_content_type(FACE, "image/png");
        let mut registry = registry();
        registry.register("_save_", "http://x.com/sky.jpg", |_| "bin/SkyURL".into(), None, Some(".img-x"));
        registry.register("_save_", FACE, |_| "bin/face".into(), None, Some(".img-x"));
        registry.register("_save_", "http://x.com/hinted", |_| "bin/h".into(), Some(".unity3d"), None);

        // Suffix wins without probing
        assert_eq!(registry.resolve_extension("http://x.com/sky.jpg", Path::new(NO_BASE), &fetcher).await, Some(".jpg".into()));
        assert_eq!(fetcher.probes(), 0);

        // Hint wins over everything
        assert_eq!(registry.resolve_extension("http://x.com/hinted", Path::new(NO_BASE), &fetcher).await, Some(".unity3d".into()));
        assert_eq!(fetcher.probes(), 0);

        // Probe is used once, then cached
        assert_eq!(registry.resolve_extension(FACE, Path::new(NO_BASE), &fetcher).await, Some(".png".into()));
        assert_eq!(registry.resolve_extension(FACE, Path::new(NO_BASE), &fetcher).await, Some(".png".into()));
        assert_eq!(fetcher.probes(), 1);
    }

    #[tokio::test]
    async fn test_resolution_falls_back() {
        let fetcher = FakeFetcher::new();
        let mut registry = registry();
        registry.register("g1", FACE, |_| "bin/face".into(), None, Some(".img-x"));
        registry.register("g1", "http://x.com/opaque", |_| "bin/opaque".into(), None, None);

        assert_eq!(registry.resolve_extension(FACE, Path::new(NO_BASE), &fetcher).await, Some(".img-x".into()));
        assert_eq!(registry.resolve_extension("http://x.com/opaque", Path::new(NO_BASE), &fetcher).await, None);
        assert_eq!(registry.get("http://x.com/opaque").unwrap().resolved_extension(), None);
    }

    #[tokio::test]
    async fn test_existing_copy_skips_probe() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("bin/CustomDeck")).unwrap();
        std::fs::write(dir.path().join("bin/CustomDeck/1-FaceURL.png"), b"old").unwrap();
        std::fs::write(dir.path().join("bin/CustomDeck/1-FaceURL.jpg.part"), b"partial").unwrap();

        let fetcher = FakeFetcher::new().with_content_type(FACE, "image/jpeg");
        let mut registry = registry();
        registry.register("g1", FACE, |_| "bin/CustomDeck/1-FaceURL".into(), None, Some(".img-x"));

        assert_eq!(
            registry.resolve_extension(FACE, dir.path(), &fetcher).await,
            Some(".png".into())
        );
        assert_eq!(fetcher.probes(), 0);
    }

    #[tokio::test]
    async fn test_resolve_all_covers_every_url() {
        let fetcher = FakeFetcher::new().with_content_type(FACE, "image/png");
        let mut registry = registry();
        registry.register("g1", FACE, |_| "bin/a".into(), None, None);
        registry.register("g2", "http://x.com/b.jpg", |_| "bin/a".into(), None, None);

        registry.resolve_all(Path::new(NO_BASE), &fetcher).await;

        let report = registry.provenance_report();
        assert_eq!(report[FACE], json!([["g1", "bin/a.png"]]));
        assert_eq!(report["http://x.com/b.jpg"], json!([["g2", "bin/a.jpg"]]));
    }

    #[tokio::test]
    async fn test_fetch_once_then_copy() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new().with_body(FACE, b"png-bytes");
        let mut registry = registry();
        registry.register("g1", FACE, |_| "a".into(), None, None);

        let first = dir.path().join("bin/a.png");
        let second = dir.path().join("bin/b.png");

        assert_eq!(registry.fetch(FACE, &first, &fetcher).await, FetchOutcome::Downloaded { bytes: 9 });
        assert_eq!(registry.fetch(FACE, &second, &fetcher).await, FetchOutcome::Copied);
        assert_eq!(registry.fetch(FACE, &first, &fetcher).await, FetchOutcome::Skipped);

        assert_eq!(fetcher.downloads(), 1);
        assert_eq!(std::fs::read(&second).unwrap(), b"png-bytes");
        assert!(!with_suffix(&first, ".part").exists());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new().failing(FACE);
        let mut registry = registry();
        registry.register("g1", FACE, |_| "a".into(), None, None);

        let dest = dir.path().join("bin/a.img-x");
        assert!(matches!(registry.fetch(FACE, &dest, &fetcher).await, FetchOutcome::Failed(_)));
        assert!(matches!(
            registry.fetch(FACE, &dir.path().join("bin/b.img-x"), &fetcher).await,
            FetchOutcome::Failed(_)
        ));

        assert_eq!(fetcher.downloads(), 1);
        assert!(!dest.exists());
        assert!(!with_suffix(&dest, ".part").exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new().with_body(FACE, b"new");
        let mut registry = registry();
        registry.register("g1", FACE, |_| "a".into(), None, None);

        let dest = dir.path().join("a.png");
        std::fs::write(&dest, b"old").unwrap();

        assert_eq!(registry.fetch(FACE, &dest, &fetcher).await, FetchOutcome::Skipped);
        assert_eq!(fetcher.downloads(), 0);
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
    }
}
