//! Authorization header parsing

/// Extract the credential from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively. Returns `None` for other
/// schemes or an empty credential.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, credential) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    if credential.is_empty() {
        None
    } else {
        Some(credential)
    }
}
