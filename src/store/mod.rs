//! License persistence seam.
//!
//! The activation flow needs exactly three things from storage: lookup by
//! key hash, insert at issuance, and an exclusive row lock around the
//! check-then-bind sequence. SQL backends map `with_license_locked` onto a
//! transaction with `SELECT ... FOR UPDATE` (or SQLite `BEGIN IMMEDIATE`)
//! and write the row back before committing.

pub mod memory;

use crate::license::License;
use crate::KeywardError;

pub use memory::MemoryLicenseStore;

/// Storage for license rows.
pub trait LicenseRepository: Send + Sync {
    /// Store a newly issued license.
    ///
    /// # Errors
    /// * `Storage` - id or key hash already present, or backend failure
    fn insert(&self, license: License) -> Result<(), KeywardError>;

    /// Snapshot of the row whose `key_hash` matches.
    fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<License>, KeywardError>;

    /// Snapshot of the row with this id.
    fn find_by_id(&self, id: &str) -> Result<Option<License>, KeywardError>;

    /// Run `f` with exclusive access to the row, persisting whatever it
    /// leaves in the row. `Ok(None)` if no such row.
    ///
    /// Concurrent callers for the same id are serialized.
    fn with_license_locked<T, F>(&self, id: &str, f: F) -> Result<Option<T>, KeywardError>
    where
        F: FnOnce(&mut License) -> T;
}
