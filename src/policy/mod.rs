//! Activation policy.

pub mod access;
