//! In-process caches.

pub mod validity;
