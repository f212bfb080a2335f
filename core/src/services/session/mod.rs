//! Session module orchestrating issuance, validation and revocation
//!
//! A session is one access token and one refresh token minted together for
//! a subject. Nothing about it is stored server-side apart from the two
//! revocation entries.

mod bearer;
mod service;

#[cfg(test)]
mod tests;

pub use bearer::extract_bearer_token;
pub use service::SessionManager;
