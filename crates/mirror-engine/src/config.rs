//! Engine configuration (mirror.toml)
//!
//! ```toml
//! [mirror]
//! permissions = "FULL_ACCESS"
//! cache_members = true
//! undeclared_failures = "warn"
//!
//! [mirror.classes]
//! "com.acme.Vault" = "PUBLIC_ONLY"
//! "com.acme.internal.**" = "READ_ALL | INVOKE_PUBLIC"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use mirror_sdk::{PermissionPolicy, ReflectionPermission};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML (including unknown permission names)
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// What to do when a hidden member raises a checked failure the contract
/// method neither declares nor wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndeclaredFailurePolicy {
    /// Propagate silently
    Propagate,
    /// Propagate and log a warning
    #[default]
    Warn,
}

/// Engine configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// `[mirror]` table
    #[serde(default)]
    pub mirror: MirrorSettings,
}

/// Settings under `[mirror]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MirrorSettings {
    /// Permissions held for every hidden class without an override
    #[serde(default)]
    pub permissions: ReflectionPermission,

    /// Memoize member resolution per (contract method, target class)
    #[serde(default = "default_cache_members")]
    pub cache_members: bool,

    /// Handling of undeclared checked failures
    #[serde(default)]
    pub undeclared_failures: UndeclaredFailurePolicy,

    /// Per-class permission overrides, keyed by class name or pattern
    #[serde(default)]
    pub classes: BTreeMap<String, ReflectionPermission>,
}

fn default_cache_members() -> bool {
    true
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            permissions: ReflectionPermission::default(),
            cache_members: default_cache_members(),
            undeclared_failures: UndeclaredFailurePolicy::default(),
            classes: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate class patterns
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in self.mirror.classes.keys() {
            if !is_valid_class_pattern(pattern) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid class pattern: {}. Wildcards are only allowed as a trailing \
                     `.*` or `.**`",
                    pattern
                )));
            }
        }
        Ok(())
    }

    /// Build the permission policy these settings describe
    pub fn permission_policy(&self) -> PermissionPolicy {
        let mut policy = PermissionPolicy::new(self.mirror.permissions);
        for (pattern, permissions) in &self.mirror.classes {
            policy.add_rule(pattern.clone(), *permissions);
        }
        policy
    }
}

fn is_valid_class_pattern(pattern: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }
    let base = pattern
        .strip_suffix(".**")
        .or_else(|| pattern.strip_suffix(".*"))
        .unwrap_or(pattern);
    !base.is_empty()
        && !base.contains('*')
        && base.split('.').all(|segment| !segment.is_empty())
}
