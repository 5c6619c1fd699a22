//! TSIG keys and key selection
//!
//! A [`Keyring`] holds every configured [`AuthKey`]; exactly one of them
//! signs a given update. Key names are unique within a keyring.

use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use domain::base::ToDname;
use domain::tsig::{Algorithm, Key, KeyName};

use crate::error::{Error, Result};

/// A shared TSIG secret
///
/// Wraps the signing key so it can be handed to a transaction without
/// copying the secret around.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the secret.
#[derive(Clone)]
pub struct AuthKey {
    key: Arc<Key>,
}

// Custom Debug implementation that hides the secret
impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKey")
            .field("name", &format_args!("{}", self.name()))
            .field("algorithm", &self.algorithm())
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

impl AuthKey {
    /// Create a key from its configured text form
    ///
    /// # Parameters
    ///
    /// - `name`: Key name, e.g. `ddns-key.example.com`
    /// - `algorithm`: One of `hmac-sha256`, `hmac-sha384`, `hmac-sha512`
    /// - `secret`: Base64-encoded shared secret
    pub fn new(name: &str, algorithm: &str, secret: &str) -> Result<Self> {
        let name = KeyName::from_str(name.trim())
            .map_err(|e| Error::key(format!("invalid key name '{}': {}", name, e)))?;
        let algorithm = parse_algorithm(algorithm)?;
        let secret = STANDARD
            .decode(secret.trim())
            .map_err(|e| Error::key(format!("secret for key {} is not valid base64: {}", name, e)))?;
        Self::from_parts(name, algorithm, &secret)
    }

    /// Create a key from an already-decoded secret
    pub fn from_parts(name: KeyName, algorithm: Algorithm, secret: &[u8]) -> Result<Self> {
        if name.is_root() {
            return Err(Error::key("key name cannot be the root"));
        }
        if secret.is_empty() {
            return Err(Error::key(format!("secret for key {} is empty", name)));
        }
        let key = Key::new(algorithm, secret, name, None, None)
            .map_err(|e| Error::key(e.to_string()))?;
        Ok(Self { key: Arc::new(key) })
    }

    /// The key name
    pub fn name(&self) -> &KeyName {
        self.key.name()
    }

    /// The HMAC algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    /// Shared handle for a TSIG transaction
    pub fn signing_key(&self) -> Arc<Key> {
        Arc::clone(&self.key)
    }

    fn is_named<N: ToDname + ?Sized>(&self, name: &N) -> bool {
        self.name().name_eq(name)
    }
}

/// Parse one of the supported HMAC algorithm names
///
/// HMAC-SHA1 is known to the TSIG layer but is not accepted for updates.
pub fn parse_algorithm(text: &str) -> Result<Algorithm> {
    let lowered = text.trim().trim_end_matches('.').to_ascii_lowercase();
    match Algorithm::from_str(&lowered) {
        Ok(Algorithm::Sha1) | Err(_) => Err(Error::key(format!(
            "unsupported TSIG algorithm '{}' (expected hmac-sha256, hmac-sha384 or hmac-sha512)",
            text
        ))),
        Ok(algorithm) => Ok(algorithm),
    }
}

/// The set of configured TSIG keys
#[derive(Clone, Debug, Default)]
pub struct Keyring {
    keys: Vec<AuthKey>,
}

impl Keyring {
    /// Build a keyring, rejecting duplicate key names
    pub fn new(keys: Vec<AuthKey>) -> Result<Self> {
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].iter().any(|k| k.is_named(key.name())) {
                return Err(Error::key(format!("duplicate key name {}", key.name())));
            }
        }
        Ok(Self { keys })
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the keyring is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Look up a key by name, ignoring ASCII case
    pub fn get<N: ToDname + ?Sized>(&self, name: &N) -> Option<&AuthKey> {
        self.keys.iter().find(|k| k.is_named(name))
    }

    /// Choose the key that signs updates for `zone`
    ///
    /// An explicitly named key must exist. Without one, a key named after
    /// the zone wins; otherwise the first configured key is used.
    pub fn select<N, Z>(&self, key_name: Option<&N>, zone: &Z) -> Result<&AuthKey>
    where
        N: ToDname + std::fmt::Display + ?Sized,
        Z: ToDname + ?Sized,
    {
        if let Some(name) = key_name {
            return self
                .get(name)
                .ok_or_else(|| Error::key(format!("key {} is not in the keyring", name)));
        }
        self.get(zone)
            .or_else(|| self.keys.first())
            .ok_or_else(|| Error::key("no TSIG keys configured"))
    }
}
