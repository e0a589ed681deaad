//! Core type definitions shared by the Vendure schema pipeline and job queue.
//!
//! This crate only holds the vocabulary both halves agree on:
//! - [`ApiType`], the two independent GraphQL API surfaces
//! - [`JobId`], time-ordered job identifiers (UUID v7)
//!
//! Anything specific to schema assembly or job execution lives in
//! `vendure-schema` and `vendure-job-queue` respectively.

mod api;
mod ids;

pub use api::ApiType;
pub use ids::JobId;

/// Errors from parsing the shared vocabulary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid API type '{0}': expected \"admin\" or \"shop\"")]
    InvalidApiType(String),
}
