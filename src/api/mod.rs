//! REST API client module for the Scriim backend.
//!
//! This module provides the `ApiClient` for submitting panic alerts to
//! the Scriim service and fetching previously submitted alerts.

pub mod client;
pub mod error;

pub use client::{ApiClient, PanicPayload, PanicRecord, PanicResponse, PayloadContact};
pub use error::ApiError;
