//! Session persistence.
//!
//! A resolution session can be interrupted and resumed later. The groups not
//! yet resolved, plus the accumulated error list, are saved as a
//! [`DupeReport`](crate::duplicates::DupeReport) in JSON. Loading a saved
//! report skips scanning and hashing entirely.
//!
//! # Architecture
//!
//! * [`io`]: saving and loading report files.

pub mod io;

pub use io::SessionError;
