use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info};

use super::chapter::Chapter;
use super::store::MANIFEST_FILE;

/// Copies every `<id>.json` chapter from `src` into `dest` and writes the
/// `index.json` manifest describing them, sorted by id.
pub fn sync_directory(src: &Path, dest: &Path) -> anyhow::Result<Vec<Chapter>> {
    fs::create_dir_all(dest).context(format!("failed to create {}", dest.display()))?;

    let mut files: Vec<_> = fs::read_dir(src)
        .context(format!("failed to read {}", src.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != MANIFEST_FILE)
        })
        .collect();
    files.sort();

    let manifest = files
        .iter()
        .map(|path| {
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context(format!("chapter file '{}' has no usable name", path.display()))?
                .to_string();

            let text = fs::read_to_string(path)
                .context(format!("failed to read chapter '{}'", id))?;
            let data: Value = serde_json::from_str(&text)
                .context(format!("chapter '{}' is not valid JSON", id))?;

            fs::write(dest.join(format!("{id}.json")), &text)
                .context(format!("failed to copy chapter '{}'", id))?;
            debug!(%id, "copied chapter");

            Ok(Chapter {
                name: data
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(&id)
                    .to_string(),
                locked: data.get("locked").and_then(Value::as_bool).unwrap_or(false),
                thumbnail: Some(format!("/chapters/{id}.png")),
                id,
            })
        })
        .collect::<anyhow::Result<Vec<Chapter>>>()?;

    let index = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    fs::write(dest.join(MANIFEST_FILE), index).context("failed to write manifest")?;
    info!(count = manifest.len(), dest = %dest.display(), "synced chapters");

    Ok(manifest)
}
