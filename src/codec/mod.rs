//! Byte-level codecs shared with independent verifiers.

pub mod key;
pub mod payload;
