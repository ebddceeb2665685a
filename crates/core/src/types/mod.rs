//! Core type definitions.

pub mod id;
pub mod status;
