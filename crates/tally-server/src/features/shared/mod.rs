//! Shared utilities used across feature slices

pub mod pagination;
