use subtle::ConstantTimeEq;

/// Service key verification for the internal admin API.
///
/// The external login/registration system authenticates with a single
/// pre-shared key (`X-Service-Key` header). Comparison is constant-time.
pub struct ServiceKeyManager {
    master_key: String,
}

impl ServiceKeyManager {
    pub fn new(master_key: String) -> Self {
        Self { master_key }
    }

    /// Verify a presented service key.
    pub fn verify(&self, key: &str) -> bool {
        // ct_eq on slices of unequal length is false without branching on
        // the content.
        key.as_bytes().ct_eq(self.master_key.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_verification() {
        let manager = ServiceKeyManager::new("my-secret-key".to_string());

        assert!(manager.verify("my-secret-key"));
        assert!(!manager.verify("wrong-key"));
        assert!(!manager.verify(""));
        assert!(!manager.verify("my-secret-key-with-suffix"));
    }
}
