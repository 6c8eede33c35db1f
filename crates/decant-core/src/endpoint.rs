//! Endpoint kinds and connection descriptors

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DescriptorError;

/// Which side of a transfer an endpoint serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Database,
    File,
}

impl EndpointKind {
    pub fn all() -> Vec<EndpointKind> {
        vec![EndpointKind::Database, EndpointKind::File]
    }

    /// The only legal counterpart: transfers never run between two
    /// endpoints of the same kind.
    pub fn other(&self) -> EndpointKind {
        match self {
            EndpointKind::Database => EndpointKind::File,
            EndpointKind::File => EndpointKind::Database,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EndpointKind::Database => "Database",
            EndpointKind::File => "Delimited File",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Database => "database",
            EndpointKind::File => "file",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for a ClickHouse-compatible database endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    /// Password credential; mutually exclusive with `bearer_token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// JWT credential; mutually exclusive with `password`
    #[serde(default, rename = "jwtToken", skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    /// Use HTTPS instead of HTTP
    #[serde(default)]
    pub secure: bool,
}

impl DatabaseConfig {
    /// The bearer token, when one is meaningfully set
    pub fn bearer(&self) -> Option<&str> {
        self.bearer_token.as_deref().filter(|t| !t.is_empty())
    }

    fn password_set(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.port == 0 {
            return Err(DescriptorError::PortOutOfRange);
        }
        if self.password_set() && self.bearer().is_some() {
            return Err(DescriptorError::CredentialConflict);
        }
        Ok(())
    }
}

/// Settings for a delimiter-separated text file endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub file_path: String,
    /// Field separator; only the first character is used
    pub delimiter: String,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.file_path.is_empty() {
            return Err(DescriptorError::EmptyPath);
        }
        if self.delimiter.is_empty() {
            return Err(DescriptorError::EmptyDelimiter);
        }
        Ok(())
    }
}

/// Immutable description of one side of a transfer.
///
/// Reconfiguring an endpoint means building a new descriptor; holders never
/// mutate one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EndpointDescriptor {
    Database(DatabaseConfig),
    File(FileConfig),
}

impl EndpointDescriptor {
    pub fn kind(&self) -> EndpointKind {
        match self {
            EndpointDescriptor::Database(_) => EndpointKind::Database,
            EndpointDescriptor::File(_) => EndpointKind::File,
        }
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        match self {
            EndpointDescriptor::Database(config) => config.validate(),
            EndpointDescriptor::File(config) => config.validate(),
        }
    }

    pub fn as_database(&self) -> Option<&DatabaseConfig> {
        match self {
            EndpointDescriptor::Database(config) => Some(config),
            EndpointDescriptor::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileConfig> {
        match self {
            EndpointDescriptor::File(config) => Some(config),
            EndpointDescriptor::Database(_) => None,
        }
    }
}
