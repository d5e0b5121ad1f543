//! Cryptographic primitives for license credentials.

pub mod digest;
pub mod signer;
