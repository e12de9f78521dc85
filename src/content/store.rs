use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::chapter::{parse_chapter, parse_manifest, Chapter, ChapterContent};
use crate::error::{Result, ServiceError};
use crate::http::{get_json, join};

pub const MANIFEST_FILE: &str = "index.json";

pub trait ManifestStore {
    /// An absent manifest is an empty one.
    fn load_manifest(&self) -> Result<Vec<Chapter>>;
}

pub trait ChapterContentStore {
    fn load_chapter(&self, id: &str) -> Result<ChapterContent>;
}

/// Static chapter files served over HTTP: `{base}/index.json`, `{base}/{id}.json`.
pub struct HttpContentStore {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpContentStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_agent(ureq::Agent::new(), base_url)
    }

    pub fn with_agent(agent: ureq::Agent, base_url: impl Into<String>) -> Self {
        Self {
            agent,
            base_url: base_url.into(),
        }
    }
}

impl ManifestStore for HttpContentStore {
    fn load_manifest(&self) -> Result<Vec<Chapter>> {
        let url = join(&self.base_url, MANIFEST_FILE);
        match get_json(&self.agent, &url) {
            Ok(body) => {
                let chapters = parse_manifest(body)?;
                info!(count = chapters.len(), "loaded chapter manifest");
                Ok(chapters)
            }
            Err(ServiceError::NotFound(_)) => {
                info!(%url, "no chapter manifest, starting with an empty list");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl ChapterContentStore for HttpContentStore {
    fn load_chapter(&self, id: &str) -> Result<ChapterContent> {
        let url = join(&self.base_url, &format!("{id}.json"));
        let body = get_json(&self.agent, &url).map_err(|e| match e {
            ServiceError::NotFound(_) => ServiceError::ContentNotFound(id.to_string()),
            other => other,
        })?;
        parse_chapter(id, body)
    }
}

/// The same layout read from a local directory.
pub struct DirContentStore {
    root: PathBuf,
}

impl DirContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_json(&self, file: &str) -> Result<Option<Value>> {
        let path = self.root.join(file);
        debug!(path = %path.display(), "reading");
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "read failed");
                return Err(ServiceError::unavailable(format!(
                    "{}: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_str(&text).map(Some).map_err(|e| {
            ServiceError::MalformedResponse(format!("{}: {e}", path.display()))
        })
    }
}

impl ManifestStore for DirContentStore {
    fn load_manifest(&self) -> Result<Vec<Chapter>> {
        match self.read_json(MANIFEST_FILE)? {
            Some(body) => parse_manifest(body),
            None => Ok(Vec::new()),
        }
    }
}

impl ChapterContentStore for DirContentStore {
    fn load_chapter(&self, id: &str) -> Result<ChapterContent> {
        // ids come from the manifest, but never let one walk out of the root
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(ServiceError::ContentNotFound(id.to_string()));
        }
        match self.read_json(&format!("{id}.json"))? {
            Some(body) => parse_chapter(id, body),
            None => Err(ServiceError::ContentNotFound(id.to_string())),
        }
    }
}
