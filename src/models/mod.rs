//! Data models for Scriim entities.
//!
//! This module contains the data structures used to represent
//! emergency-alert data:
//!
//! - `Contact`: user-configured emergency contacts with loose phone validation
//! - `Authority`, `AuthorityKind`: the built-in emergency-service catalog

pub mod authority;
pub mod contact;

pub use authority::{Authority, AuthorityKind};
pub use contact::Contact;
