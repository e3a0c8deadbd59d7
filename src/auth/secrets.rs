use rand::{Rng, distributions::Alphanumeric, thread_rng};
use sha2::{Digest, Sha256};

/// Marks bearer strings that are API tokens rather than session JWTs.
pub const API_TOKEN_PREFIX: &str = "w9k_";

/// Lifetime of signup verification and password reset tokens.
pub const SINGLE_USE_TOKEN_TTL_MINUTES: i64 = 30;

const API_TOKEN_LEN: usize = 48;
const SINGLE_USE_TOKEN_LEN: usize = 40;

fn random_alphanumeric(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_api_token() -> String {
    format!("{API_TOKEN_PREFIX}{}", random_alphanumeric(API_TOKEN_LEN))
}

/// Signup verification and password reset tokens.
pub fn generate_single_use_token() -> String {
    random_alphanumeric(SINGLE_USE_TOKEN_LEN)
}

pub fn looks_like_api_token(bearer: &str) -> bool {
    bearer.starts_with(API_TOKEN_PREFIX)
}

/// Hex SHA-256; the only form in which secrets are stored.
pub fn digest(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}
