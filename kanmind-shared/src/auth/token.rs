/// Opaque login token utilities
///
/// Tokens are 20 random bytes rendered as 40 lowercase hex characters. They
/// carry no claims: the only way to learn who a token belongs to is to look
/// it up through a `store::TokenIssuer`.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::token::{generate_token_key, validate_token_format};
///
/// let key = generate_token_key();
/// assert_eq!(key.len(), 40);
/// assert!(validate_token_format(&key));
/// ```

use rand::RngCore;

/// Number of random bytes in a token
const TOKEN_BYTES: usize = 20;

/// Length of a token key (hex encoded)
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a new random token key
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Checks the shape of a token before any lookup
pub fn validate_token_format(key: &str) -> bool {
    key.len() == TOKEN_LENGTH && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Constant-time string comparison
///
/// Used by in-memory token lookups so a comparison does not leak how many
/// leading characters matched.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
