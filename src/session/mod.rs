//! Session module
//!
//! Cookie-identified server-side sessions and the visit counter built on
//! them.

mod store;
mod visits;

pub use store::{Session, SessionData, SessionStore};
pub use visits::record_visit;
