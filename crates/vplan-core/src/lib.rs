//! Domain logic for the holiday plan API.
//!
//! - [`plan`]: validation rules and the transactional plan service.
//! - [`pdf`]: HTML document assembly and the HTML-to-PDF renderer seam.
//! - [`auth`]: HMAC token issuance and validation for the bearer gate.

pub mod auth;
pub mod pdf;
pub mod plan;
