//! # agora-shared
//!
//! Types shared by the forum client and the media proxy server: the
//! client-visible forum data model, id newtypes, request bodies, and the
//! validation errors raised before anything reaches the backend.

pub mod badges;
pub mod constants;
pub mod error;
pub mod models;
pub mod types;

pub use error::ValidationError;
