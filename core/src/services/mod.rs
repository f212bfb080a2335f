//! Business services containing session logic.

pub mod session;
pub mod token;

// Re-export commonly used types
pub use session::{extract_bearer_token, SessionManager};
pub use token::{Clock, ManualClock, SystemClock, TokenCodec, TokenServiceConfig};
