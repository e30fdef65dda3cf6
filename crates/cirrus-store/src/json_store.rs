//! Flat-file location storage: the whole list in one JSON document.
//!
//! Every operation reads the document, applies the change and writes it back
//! through a temporary file, so a crash never leaves a half-written list.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cirrus_core::StoreError;
use serde::{Deserialize, Serialize};

use crate::backend::{require_id, LocationStore, StoreResult};
use crate::location::{LocationId, TrackedLocation};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocationDocument {
    /// Next id to hand out; only ever grows.
    #[serde(default)]
    next_id: LocationId,
    #[serde(default)]
    locations: Vec<TrackedLocation>,
}

/// Older files hold a bare array of locations.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Legacy(Vec<TrackedLocation>),
    Document(LocationDocument),
}

impl LocationDocument {
    /// Give every id-less entry an id and make `next_id` exceed all of them.
    fn normalize(mut self) -> Self {
        let max_id = self.locations.iter().filter_map(|l| l.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1).max(1);

        for location in self.locations.iter_mut().filter(|l| l.id.is_none()) {
            location.id = Some(self.next_id);
            self.next_id += 1;
        }
        self
    }
}

/// JSON-file-based location storage.
pub struct JsonLocationStore {
    path: PathBuf,
}

impl JsonLocationStore {
    /// Store backed by `path`. The file is created on the first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored location, failing with `StoreError::Parse` when the file
    /// cannot be decoded. A missing file reads as empty.
    pub fn read_strict(&self) -> StoreResult<Vec<TrackedLocation>> {
        Ok(self.load_strict()?.locations)
    }

    fn load_strict(&self) -> StoreResult<LocationDocument> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LocationDocument::default()),
            Err(e) => {
                return Err(StoreError::persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let document = match serde_json::from_str::<OnDisk>(&content) {
            Ok(OnDisk::Document(doc)) => doc,
            Ok(OnDisk::Legacy(locations)) => LocationDocument {
                next_id: 0,
                locations,
            },
            Err(e) => {
                return Err(StoreError::parse(format!(
                    "Location file {} is malformed: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        Ok(document.normalize())
    }

    /// Like [`Self::load_strict`], but an undecodable file reads as empty.
    fn load(&self) -> StoreResult<LocationDocument> {
        match self.load_strict() {
            Err(StoreError::Parse(message)) => {
                tracing::error!("{}, treating it as empty", message);
                Ok(LocationDocument::default())
            }
            other => other,
        }
    }

    fn save(&self, document: &LocationDocument) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::persistence(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::persistence(format!("Failed to encode locations: {}", e)))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, content).map_err(|e| {
            StoreError::persistence(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            StoreError::persistence(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

impl LocationStore for JsonLocationStore {
    fn list_all(&self) -> StoreResult<Vec<TrackedLocation>> {
        Ok(self.load()?.locations)
    }

    fn insert(&self, location: &TrackedLocation) -> StoreResult<LocationId> {
        let mut document = self.load()?;
        let id = location.id.unwrap_or(document.next_id);

        if document.locations.iter().any(|l| l.id == Some(id)) {
            return Err(StoreError::persistence(format!(
                "Location id {} is already taken",
                id
            )));
        }

        let mut stored = location.clone();
        stored.id = Some(id);
        document.locations.push(stored);
        document.next_id = document.next_id.max(id + 1);

        self.save(&document)?;
        tracing::debug!("Inserted location {} ({})", id, location.name);
        Ok(id)
    }

    fn update(&self, location: &TrackedLocation) -> StoreResult<()> {
        let id = require_id(location)?;
        let mut document = self.load()?;

        let slot = document
            .locations
            .iter_mut()
            .find(|l| l.id == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        *slot = location.clone();

        self.save(&document)
    }

    fn delete_by_id(&self, id: LocationId) -> StoreResult<()> {
        let mut document = self.load()?;
        let before = document.locations.len();
        document.locations.retain(|l| l.id != Some(id));

        if document.locations.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.save(&document)
    }
}
