//! Credential bundle and activation wire models.

pub mod bundle;
pub mod models;
