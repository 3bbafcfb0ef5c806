use crate::kv::KvStore;
use crate::payloads::{ImportMode, ImportReport, PayloadStore};
use crate::StorageError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Where the shared loot export lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedSource {
    Url(String),
    Path(PathBuf),
}

impl FromStr for SharedSource {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("shared source cannot be empty".to_string());
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(SharedSource::Url(trimmed.to_string()));
        }
        let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
        Ok(SharedSource::Path(PathBuf::from(path)))
    }
}

impl fmt::Display for SharedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharedSource::Url(url) => f.write_str(url),
            SharedSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read the shared export body once. No retries.
pub fn fetch_shared(source: &SharedSource) -> Result<String, FetchError> {
    match source {
        SharedSource::Url(url) => {
            // One attempt, no deadline.
            let client = reqwest::blocking::Client::builder()
                .timeout(None::<Duration>)
                .build()?;
            let resp = client.get(url).send()?;
            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok(resp.text()?)
        }
        SharedSource::Path(path) => Ok(std::fs::read_to_string(path)?),
    }
}

impl<S: KvStore> PayloadStore<S> {
    /// Fetch the shared export and merge it into the store.
    pub fn import_shared(&mut self, source: &SharedSource) -> Result<ImportReport, FetchError> {
        let body = fetch_shared(source)?;
        info!(%source, bytes = body.len(), "shared export fetched");
        Ok(self.import_text(&body, ImportMode::Merge)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::payloads::ImportOutcome;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::NamedTempFile;

    /// Serve one HTTP response on a local port after `delay`.
    fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut line = String::new();
            while reader.read_line(&mut line).expect("read") > 2 {
                line.clear();
            }
            thread::sleep(delay);
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("respond");
        });
        format!("http://{addr}/loot.json")
    }

    #[test]
    fn parses_sources() {
        assert_eq!(
            "https://example.org/loot.json".parse::<SharedSource>(),
            Ok(SharedSource::Url("https://example.org/loot.json".to_string()))
        );
        assert_eq!(
            "file:///srv/loot.json".parse::<SharedSource>(),
            Ok(SharedSource::Path(PathBuf::from("/srv/loot.json")))
        );
        assert_eq!(
            "../json/loot.json".parse::<SharedSource>(),
            Ok(SharedSource::Path(PathBuf::from("../json/loot.json")))
        );
        assert!("  ".parse::<SharedSource>().is_err());
    }

    #[test]
    fn imports_shared_file_once() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"player":"Alice","realm":"Thunderstrike","runs":[{{"instance":"BFD","bosses":[{{"name":"Gelihast","loots":[{{"item":"Cloak","quality":2}}]}}]}}]}}"#
        )
        .expect("write");

        let source = SharedSource::Path(file.path().to_path_buf());
        let mut store = PayloadStore::new(MemoryStore::new());
        let first = store.import_shared(&source).expect("first fetch");
        assert_eq!(first.outcome, ImportOutcome::Added);
        assert_eq!(first.loots, 1);
        let second = store.import_shared(&source).expect("second fetch");
        assert_eq!(second.outcome, ImportOutcome::Duplicate);
    }

    #[test]
    fn missing_source_leaves_store_untouched() {
        let mut store = PayloadStore::new(MemoryStore::new());
        let source = SharedSource::Path(PathBuf::from("/nonexistent/loot-tracker/shared.json"));
        let err = store.import_shared(&source).expect_err("missing file");
        assert!(matches!(err, FetchError::Io(_)));
        assert!(store.load_payloads().expect("load").is_empty());
    }

    #[test]
    fn malformed_shared_body_is_a_parse_failure() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{{not json").expect("write");
        let mut store = PayloadStore::new(MemoryStore::new());
        let err = store
            .import_shared(&SharedSource::Path(file.path().to_path_buf()))
            .expect_err("bad body");
        assert!(matches!(
            err,
            FetchError::Storage(StorageError::Payload(ref e)) if e.is_parse()
        ));
    }

    #[test]
    fn fetches_shared_export_over_http() {
        let url = serve_once(
            "200 OK",
            r#"{"player":"Alice","realm":"Thunderstrike","runs":[]}"#,
            Duration::from_millis(1500),
        );
        let source: SharedSource = url.parse().expect("url source");
        let mut store = PayloadStore::new(MemoryStore::new());
        let report = store.import_shared(&source).expect("fetch");
        assert_eq!(report.outcome, ImportOutcome::Added);
        assert_eq!(report.player, "Alice");
    }

    #[test]
    fn http_error_status_leaves_store_untouched() {
        let url = serve_once("404 Not Found", "missing", Duration::ZERO);
        let source: SharedSource = url.parse().expect("url source");
        let mut store = PayloadStore::new(MemoryStore::new());
        let err = store.import_shared(&source).expect_err("404");
        assert!(matches!(err, FetchError::Status(404)));
        assert!(store.load_payloads().expect("load").is_empty());
    }
}
