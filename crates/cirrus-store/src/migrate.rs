//! Migration from the flat JSON file to the SQLite store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backend::LocationStore;
use crate::json_store::JsonLocationStore;
use crate::sqlite_store::SqliteLocationStore;

/// Result of a migration operation.
#[derive(Debug, Clone, Default)]
pub struct MigrationResult {
    /// Number of locations successfully migrated.
    pub migrated: usize,
    /// Number of locations skipped (already present).
    pub skipped: usize,
    /// Number of locations that failed to migrate.
    pub failed: usize,
    /// Error messages for failed locations.
    pub errors: Vec<String>,
}

impl MigrationResult {
    /// Total number of locations processed.
    pub fn total(&self) -> usize {
        self.migrated + self.skipped + self.failed
    }

    /// Check if all locations were successfully processed (none failed).
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for MigrationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Migration complete: {} migrated, {} skipped, {} failed (total: {})",
            self.migrated,
            self.skipped,
            self.failed,
            self.total()
        )
    }
}

/// Copy every location of a JSON location file into `store`.
///
/// # Behavior
/// - A location whose name and coordinates already exist in the store is skipped.
/// - Ids and `last_updated_at` are preserved; entries from files that predate
///   staleness tracking load as never fetched.
/// - When a file id is in use or was handed out before by the store, the
///   entry gets a fresh id instead.
/// - An unreadable file fails the whole migration and nothing is copied.
/// - Safe to run multiple times.
pub fn migrate_from_json<P: AsRef<Path>>(
    json_path: P,
    store: &SqliteLocationStore,
) -> Result<MigrationResult> {
    let json_path = json_path.as_ref();

    if !json_path.exists() {
        return Err(anyhow::anyhow!(
            "Location file not found: {}",
            json_path.display()
        ));
    }

    tracing::info!("Starting migration from location file: {}", json_path.display());

    let locations = JsonLocationStore::new(json_path)
        .read_strict()
        .context("Failed to read location file")?;
    tracing::info!("Found {} locations in location file", locations.len());

    let id_ceiling = store
        .highest_assigned_id()
        .context("Failed to read the store's id sequence")?;
    let mut result = MigrationResult::default();

    for mut location in locations {
        match store.find_place(&location.name, location.latitude, location.longitude) {
            Ok(Some(existing)) => {
                tracing::debug!("Skipping existing location: {} ({})", location.name, existing);
                result.skipped += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                let error_msg = format!("Failed to check location {}: {}", location.name, e);
                tracing::warn!("{}", error_msg);
                result.errors.push(error_msg);
                result.failed += 1;
                continue;
            }
        }

        if let Some(id) = location.id {
            match store.exists(id).map(|taken| taken || id <= id_ceiling) {
                Ok(true) => {
                    tracing::warn!(
                        "Id {} was already handed out, assigning a new id to {}",
                        id,
                        location.name
                    );
                    location.id = None;
                }
                Ok(false) => {}
                Err(e) => {
                    let error_msg = format!("Failed to check id {}: {}", id, e);
                    tracing::warn!("{}", error_msg);
                    result.errors.push(error_msg);
                    result.failed += 1;
                    continue;
                }
            }
        }

        match store.insert(&location) {
            Ok(id) => {
                tracing::debug!("Migrated location: {} ({})", location.name, id);
                result.migrated += 1;
            }
            Err(e) => {
                let error_msg = format!("Failed to migrate location {}: {}", location.name, e);
                tracing::warn!("{}", error_msg);
                result.errors.push(error_msg);
                result.failed += 1;
            }
        }
    }

    tracing::info!("{}", result);
    Ok(result)
}

/// Run [`migrate_from_json`] and, when nothing failed, rename the file to
/// `<name>.migrated` so the next start does not import it again.
pub fn migrate_legacy_file<P: AsRef<Path>>(
    json_path: P,
    store: &SqliteLocationStore,
) -> Result<MigrationResult> {
    let json_path = json_path.as_ref();
    let result = migrate_from_json(json_path, store)?;

    if result.is_success() {
        let retired = retired_path(json_path);
        std::fs::rename(json_path, &retired).with_context(|| {
            format!("Failed to rename {} to {}", json_path.display(), retired.display())
        })?;
        tracing::info!("Moved migrated location file to {}", retired.display());
    } else {
        tracing::warn!(
            "Keeping {} in place: {} locations failed to migrate",
            json_path.display(),
            result.failed
        );
    }

    Ok(result)
}

fn retired_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".migrated");
    PathBuf::from(name)
}
