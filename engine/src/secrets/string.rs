use std::fmt;

/// An API key that never shows up in logs or error text.
///
/// `Debug` and `Display` both print `[REDACTED]`; only [`SecretString::expose`]
/// hands out the raw value, and providers call it at the point where the
/// request header is built.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a key, trimming surrounding whitespace from env files
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Authorization` header value for bearer-token APIs
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_formats_the_key() {
        let key = SecretString::new("sk-live-abcdef");
        assert_eq!(format!("{}", key), "[REDACTED]");
        assert_eq!(format!("{:?}", key), "SecretString([REDACTED])");
        assert_eq!(key.expose(), "sk-live-abcdef");
    }

    #[test]
    fn test_trims_and_builds_bearer() {
        let key = SecretString::from("  sk-live-abcdef\n".to_string());
        assert_eq!(key.bearer(), "Bearer sk-live-abcdef");
        assert!(SecretString::new("   ").is_empty());
    }
}
