//! In-process license store with per-row locks.

use crate::license::License;
use crate::store::LicenseRepository;
use crate::KeywardError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Arc<Mutex<License>>>,
    by_key_hash: HashMap<String, String>,
}

/// In-memory [`LicenseRepository`].
///
/// The table lock only guards the maps; each row has its own mutex, so
/// activations of different licenses do not contend.
#[derive(Default)]
pub struct MemoryLicenseStore {
    tables: RwLock<Tables>,
}

impl MemoryLicenseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored licenses.
    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.rows.len()).unwrap_or_default()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn row(&self, id: &str) -> Result<Option<Arc<Mutex<License>>>, KeywardError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.rows.get(id).cloned())
    }
}

impl LicenseRepository for MemoryLicenseStore {
    fn insert(&self, license: License) -> Result<(), KeywardError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        if tables.rows.contains_key(&license.id) {
            return Err(KeywardError::Storage(format!(
                "license {} already exists",
                license.id
            )));
        }
        if tables.by_key_hash.contains_key(&license.key_hash) {
            return Err(KeywardError::Storage(
                "license key hash already exists".to_string(),
            ));
        }

        tables
            .by_key_hash
            .insert(license.key_hash.clone(), license.id.clone());
        tables
            .rows
            .insert(license.id.clone(), Arc::new(Mutex::new(license)));
        Ok(())
    }

    fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<License>, KeywardError> {
        let row = {
            let tables = self.tables.read().map_err(|_| poisoned())?;
            tables
                .by_key_hash
                .get(key_hash)
                .and_then(|id| tables.rows.get(id))
                .cloned()
        };

        let Some(row) = row else {
            return Ok(None);
        };
        let license = row.lock().map_err(|_| poisoned())?.clone();
        Ok(Some(license))
    }

    fn find_by_id(&self, id: &str) -> Result<Option<License>, KeywardError> {
        let Some(row) = self.row(id)? else {
            return Ok(None);
        };
        let license = row.lock().map_err(|_| poisoned())?.clone();
        Ok(Some(license))
    }

    fn with_license_locked<T, F>(&self, id: &str, f: F) -> Result<Option<T>, KeywardError>
    where
        F: FnOnce(&mut License) -> T,
    {
        let Some(row) = self.row(id)? else {
            return Ok(None);
        };
        let mut guard = row.lock().map_err(|_| poisoned())?;
        Ok(Some(f(&mut *guard)))
    }
}

fn poisoned() -> KeywardError {
    KeywardError::Storage("license store lock poisoned".to_string())
}
