//! Token module for JWT encoding and verification
//!
//! This module handles the stateless half of session management:
//! - Signing subjects into expiring access and refresh tokens
//! - Verifying signature and expiry of presented tokens
//! - The clock the expiry checks run against

mod clock;
mod codec;
mod config;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::TokenCodec;
pub use config::{TokenServiceConfig, MAX_TOKEN_LIFETIME_DAYS};
