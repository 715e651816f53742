/// Single-use random hashes
///
/// One generator backs three things: the email confirmation hash, the
/// password reset hash, and the per-session hash that refresh tokens are
/// bound to. Each value is the hex SHA-256 of a fresh random string, so it is
/// always 64 lowercase hex characters and safe to embed in a URL path.
///
/// Confirmation and reset hashes share the user's `hash` column, so the
/// stored value is tagged with a [`HashPurpose`]. Only the bare hash is
/// mailed; a hash issued for one purpose never matches a lookup for the other.
///
/// # Example
///
/// ```
/// use coophub_shared::auth::hash::{generate_hash, is_valid_hash, hashes_match};
///
/// let hash = generate_hash();
/// assert_eq!(hash.len(), 64);
/// assert!(is_valid_hash(&hash));
/// assert!(hashes_match(&hash, &hash.clone()));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the random seed fed into SHA-256
const SEED_LENGTH: usize = 32;

/// Length of a generated hash (hex SHA-256)
pub const HASH_LENGTH: usize = 64;

/// Generates a new single-use hash
pub fn generate_hash() -> String {
    let seed = random_string(SEED_LENGTH);

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())
}

fn random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Checks that a value looks like a generated hash
///
/// Confirmation and reset handlers call this before touching the store.
pub fn is_valid_hash(value: &str) -> bool {
    value.len() == HASH_LENGTH && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// What a mailed hash was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashPurpose {
    ConfirmEmail,
    ResetPassword,
}

impl HashPurpose {
    fn prefix(self) -> &'static str {
        match self {
            HashPurpose::ConfirmEmail => "confirm",
            HashPurpose::ResetPassword => "reset",
        }
    }

    /// Value stored on the user for `hash`
    pub fn tag(self, hash: &str) -> String {
        format!("{}:{}", self.prefix(), hash)
    }
}

/// Constant-time comparison of two hashes
pub fn hashes_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
