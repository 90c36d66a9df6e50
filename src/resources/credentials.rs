//! # Tester identity and credentials.
//!
//! - [`ProductType`] five known device families, serialized as integers.
//! - [`ResourceId`] stable pool key: md5 hex of `"host:port"`.
//! - [`Credentials`] connection parameters, immutable once a resource exists.
//! - [`StoredResource`] durable record of a known tester.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ResourceError;

/// Default management port of a tester.
pub const DEFAULT_PORT: u16 = 22606;

/// Default tester password.
pub const DEFAULT_PASSWORD: &str = "xena";

/// Device family of a tester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProductType {
    Valkyrie = 1,
    Vulkan = 2,
    Safire = 3,
    Vantage = 4,
    Chimera = 5,
}

/// Session protocol family spoken by a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Layer 2-3 traffic generators.
    L23,
    /// Layer 4-7 traffic generators.
    L47,
}

impl ProductType {
    /// Protocol family used to open a session with this product.
    pub fn driver(&self) -> DriverKind {
        match self {
            ProductType::Vulkan | ProductType::Safire => DriverKind::L47,
            ProductType::Valkyrie | ProductType::Vantage | ProductType::Chimera => DriverKind::L23,
        }
    }

    /// Upper-case product name.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProductType::Valkyrie => "VALKYRIE",
            ProductType::Vulkan => "VULKAN",
            ProductType::Safire => "SAFIRE",
            ProductType::Vantage => "VANTAGE",
            ProductType::Chimera => "CHIMERA",
        }
    }
}

impl TryFrom<u8> for ProductType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProductType::Valkyrie),
            2 => Ok(ProductType::Vulkan),
            3 => Ok(ProductType::Safire),
            4 => Ok(ProductType::Vantage),
            5 => Ok(ProductType::Chimera),
            other => Err(format!("unknown product type {other}")),
        }
    }
}

impl From<ProductType> for u8 {
    fn from(value: ProductType) -> Self {
        value as u8
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Primary key of a tester in the pool and in the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Derives the id of the tester listening on `host:port`.
    pub fn from_endpoint(host: &str, port: u16) -> Self {
        Self(format!("{:x}", md5::compute(format!("{host}:{port}"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Tester password; never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Default for Password {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Connection parameters of a tester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub product: ProductType,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Password,
}

impl Credentials {
    /// Credentials with the default port and password.
    pub fn new(product: ProductType, host: impl Into<String>) -> Self {
        Self {
            product,
            host: host.into(),
            port: DEFAULT_PORT,
            password: Password::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Password::new(password);
        self
    }

    /// Id derived from `(host, port)` only.
    pub fn id(&self) -> ResourceId {
        ResourceId::from_endpoint(&self.host, self.port)
    }

    /// Rejects an empty host or port `0`.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.host.trim().is_empty() {
            return Err(ResourceError::InvalidCredentials {
                reason: "host must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(ResourceError::InvalidCredentials {
                reason: "port must be in 1..=65535".into(),
            });
        }
        Ok(())
    }

    /// Rebuilds credentials from a durable record.
    pub fn from_stored(record: &StoredResource) -> Self {
        Self {
            product: record.product,
            host: record.host.clone(),
            port: record.port,
            password: record.password.clone(),
        }
    }
}

/// Durable record of a known tester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResource {
    pub id: ResourceId,
    pub product: ProductType,
    pub host: String,
    pub port: u16,
    pub password: Password,
    pub name: String,
    #[serde(default)]
    pub keep_disconnected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_depends_on_endpoint_only() {
        let a = Credentials::new(ProductType::Valkyrie, "10.0.0.1").with_password("one");
        let b = Credentials::new(ProductType::Vulkan, "10.0.0.1").with_password("two");
        let c = Credentials::new(ProductType::Valkyrie, "10.0.0.1").with_port(22611);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.id().as_str().len(), 32);
    }

    #[test]
    fn test_id_is_md5_of_endpoint() {
        assert_eq!(
            ResourceId::from_endpoint("localhost", 22606),
            ResourceId::from(format!("{:x}", md5::compute("localhost:22606"))),
        );
    }

    #[test]
    fn test_defaults_when_deserializing() {
        let creds: Credentials =
            serde_json::from_str(r#"{"product": 4, "host": "demo"}"#).unwrap();
        assert_eq!(creds.port, DEFAULT_PORT);
        assert_eq!(creds.password.expose(), DEFAULT_PASSWORD);
        assert_eq!(creds.product, ProductType::Vantage);
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        let res: Result<Credentials, _> = serde_json::from_str(r#"{"product": 9, "host": "demo"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Credentials::new(ProductType::Safire, "h").validate().is_ok());
        assert!(Credentials::new(ProductType::Safire, " ").validate().is_err());
        assert!(Credentials::new(ProductType::Safire, "h").with_port(0).validate().is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let creds = Credentials::new(ProductType::Chimera, "h").with_password("secret");
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_driver_kind() {
        assert_eq!(ProductType::Vulkan.driver(), DriverKind::L47);
        assert_eq!(ProductType::Safire.driver(), DriverKind::L47);
        assert_eq!(ProductType::Chimera.driver(), DriverKind::L23);
    }
}
