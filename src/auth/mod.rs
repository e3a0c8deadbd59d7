pub mod bootstrap;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod secrets;
pub mod turnstile;
mod types;

pub use types::{Claims, Credential, CredentialKind, Principal, Role, SessionToken};

/// Trimmed and lowercased; the only form in which emails are stored or compared.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
