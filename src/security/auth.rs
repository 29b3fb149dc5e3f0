//! Shared-secret password check for save requests.

/// Compare `provided` against the configured secret without short-circuiting
/// on the first differing byte.
pub fn verify_password(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    let mut diff = expected.len() ^ provided.len();
    for (i, &b) in provided.iter().enumerate() {
        let e = expected.get(i).copied().unwrap_or(0);
        diff |= usize::from(e ^ b);
    }
    diff == 0
}
