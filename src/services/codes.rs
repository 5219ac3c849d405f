use std::future::Future;

use rand::Rng;

use crate::error::ServiceError;

/// Alphabet used for join codes; vowel-free so codes never spell words.
const CODE_ALPHABET: &[u8] = b"BCDFGHJKLMNPQRSTWXZ";

/// Attempts before code generation gives up and reports an internal error.
const MAX_ATTEMPTS: u32 = 64;

/// Produce one random code of `length` characters from the restricted alphabet.
pub fn random_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate codes until `is_free` accepts one.
///
/// The predicate sees each candidate exactly once; generation stops after
/// [`MAX_ATTEMPTS`] rejections rather than looping forever on a saturated
/// code space.
pub async fn generate_unique<F, Fut>(length: usize, mut is_free: F) -> Result<String, ServiceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, ServiceError>>,
{
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code(length);
        if is_free(code.clone()).await? {
            return Ok(code);
        }
    }

    Err(ServiceError::Internal(format!(
        "no free join code found after {MAX_ATTEMPTS} attempts"
    )))
}

/// Whether `code` could have been produced by [`random_code`].
pub fn is_valid_code(code: &str, length: usize) -> bool {
    code.len() == length && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}
