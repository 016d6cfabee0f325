//! HTTP protocol layer module
//!
//! Response builders, cookies and url-encoded bodies, decoupled from the
//! views that use them.

pub mod cookies;
pub mod form;
pub mod response;

// Re-export commonly used types
pub use form::{parse_form, parse_query, with_query_param};
pub use response::{
    build_403_response, build_404_response, build_405_response, build_413_response, build_500_response,
    build_html_response, build_redirect_response, build_redirect_response_with_code,
    build_text_response, strip_body,
};
