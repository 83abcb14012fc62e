//! Durable on-device storage for the user's profile.
//!
//! Owns the persisted name and emergency-contact list; the dispatcher only
//! ever reads them.

pub mod contacts;

pub use contacts::ContactStore;
