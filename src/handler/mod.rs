//! Request handler module
//!
//! Turns hyper requests into view calls: body limits, session and remote
//! user resolution, route dispatch and access logging.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
