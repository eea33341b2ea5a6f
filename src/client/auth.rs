use std::fmt;

/// API key passed to the remote resource as the `api-key` query parameter.
///
/// `Display` and `Debug` never print the key itself, so it is safe to pass
/// around in log lines and error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request URLs only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&"***").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("579b464db66ec23bdd000001");
        assert_eq!(key.to_string(), "***");
        assert!(!format!("{:?}", key).contains("579b"));
        assert_eq!(key.expose(), "579b464db66ec23bdd000001");
    }

    #[test]
    fn test_blank_api_key_is_empty() {
        assert!(ApiKey::new("  ").is_empty());
        assert!(!ApiKey::new("abc").is_empty());
    }
}
