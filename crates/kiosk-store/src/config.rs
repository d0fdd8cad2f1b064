//! Store configuration

/// Default reserved administrator e-mail
const DEFAULT_ADMIN_EMAIL: &str = "admin@iptv.com";

/// Minimum password length enforced before any remote call
const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Storefront policy knobs
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// The reserved e-mail that receives the admin role at profile
    /// creation; every other account becomes a client
    pub admin_email: String,
    /// Passwords shorter than this are rejected locally
    pub min_password_len: usize,
    /// First-run convenience: when the reserved admin e-mail fails to
    /// log in with invalid credentials, sign it up and retry once
    pub bootstrap_admin: bool,
}

impl StoreConfig {
    /// Create a config with the default policy
    pub fn new() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            bootstrap_admin: true,
        }
    }

    /// Set the reserved administrator e-mail
    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = email.into();
        self
    }

    /// Set the minimum password length
    pub fn with_min_password_len(mut self, len: usize) -> Self {
        self.min_password_len = len;
        self
    }

    /// Enable or disable first-run admin bootstrap
    pub fn with_bootstrap_admin(mut self, enabled: bool) -> Self {
        self.bootstrap_admin = enabled;
        self
    }

    /// Whether the given e-mail is the reserved administrator address
    pub fn is_admin_email(&self, email: &str) -> bool {
        email.eq_ignore_ascii_case(&self.admin_email)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
