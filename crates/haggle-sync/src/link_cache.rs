// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent set of conversation links already discovered.
//!
//! The cache is a JSON array of strings. Writes go to a temp file in the
//! same directory which is then renamed over the previous file, so a crash
//! mid-write leaves the old cache intact.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use haggle_core::HaggleError;
use tracing::{debug, error, info};

/// Query marker of links that came from the "observed ad" recommendation strip.
const TRACKING_MARKER: &str = "reason=observed_ad";

/// Parameters that open the listing with its chat panel expanded.
const CHAT_PARAMS: &str = "chat=1&isPreviewActive=0";

/// Canonical spelling of a listing link.
///
/// Relative links are resolved against `base_url`, tracking query strings are
/// dropped, and the chat-opening parameters are put first in the query.
/// Normalizing an already normalized link returns it unchanged.
pub fn normalize_link(base_url: &str, raw: &str) -> String {
    let raw = raw.trim();
    let mut link = if raw.starts_with('/') {
        format!("{}{raw}", base_url.trim_end_matches('/'))
    } else {
        raw.to_string()
    };

    if link.contains(TRACKING_MARKER) {
        if let Some((path, _)) = link.split_once('?') {
            link = path.to_string();
        }
    }

    if link.contains(CHAT_PARAMS) {
        return link;
    }
    match link.split_once('?') {
        Some((path, query)) if !query.is_empty() => format!("{path}?{CHAT_PARAMS}&{query}"),
        Some((path, _)) => format!("{path}?{CHAT_PARAMS}"),
        None => format!("{link}?{CHAT_PARAMS}"),
    }
}

/// Set of links that never expire, backed by a JSON file.
#[derive(Debug)]
pub struct LinkCache {
    path: PathBuf,
    links: BTreeSet<String>,
    dirty: bool,
}

impl LinkCache {
    /// An empty cache that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            links: BTreeSet::new(),
            dirty: false,
        }
    }

    /// Load the cache from `path`.
    ///
    /// A missing file yields an empty cache. An unreadable or corrupt file is
    /// logged and also yields an empty cache.
    pub fn load_from_disk(path: impl Into<PathBuf>) -> Self {
        let mut cache = Self::new(path);
        let contents = match std::fs::read_to_string(&cache.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %cache.path.display(), "no link cache found, starting empty");
                return cache;
            }
            Err(e) => {
                error!(path = %cache.path.display(), error = %e, "failed to read link cache");
                return cache;
            }
        };

        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(links) => {
                cache.links = links.into_iter().collect();
                info!(path = %cache.path.display(), links = cache.links.len(), "link cache loaded");
            }
            Err(e) => {
                error!(path = %cache.path.display(), error = %e, "corrupt link cache, starting empty");
            }
        }
        cache
    }

    pub fn has(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Add `link`. Returns `true` when it was not cached before.
    pub fn add(&mut self, link: impl Into<String>) -> bool {
        let added = self.links.insert(link.into());
        self.dirty |= added;
        added
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether links were added since the last successful persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Atomically write the cache to disk.
    pub fn persist(&mut self) -> Result<(), HaggleError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(storage_err)?;

        let links: Vec<&String> = self.links.iter().collect();
        let json = serde_json::to_vec(&links)
            .map_err(|e| HaggleError::Internal(format!("failed to encode link cache: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(storage_err)?;
        tmp.write_all(&json).map_err(storage_err)?;
        tmp.as_file().sync_all().map_err(storage_err)?;
        tmp.persist(&self.path).map_err(|e| storage_err(e.error))?;

        self.dirty = false;
        debug!(path = %self.path.display(), links = self.links.len(), "link cache persisted");
        Ok(())
    }
}

fn storage_err(e: std::io::Error) -> HaggleError {
    HaggleError::Storage { source: e.into() }
}
