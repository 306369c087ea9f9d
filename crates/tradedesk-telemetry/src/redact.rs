//! Masking helpers for sensitive account fields.

const VISIBLE_LOGIN_CHARS: usize = 4;

/// Mask an account login, keeping only its last four characters.
///
/// Logins of four characters or fewer are masked entirely.
#[must_use]
pub fn mask_login(login: &str) -> String {
    let login = login.trim();
    let count = login.chars().count();
    if count <= VISIBLE_LOGIN_CHARS {
        return "*".repeat(count.max(1));
    }
    let tail: String = login.chars().skip(count - VISIBLE_LOGIN_CHARS).collect();
    format!("****{tail}")
}

/// Replacement for credentials in log output.
#[must_use]
pub fn redact_secret(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "<redacted>" }
}
