//! Contract manifests (contracts.toml)
//!
//! Contracts can be declared in TOML instead of code:
//!
//! ```toml
//! [[contract]]
//! name = "Point"
//! mirrors = "com.acme.geom.Point"
//!
//! [[contract.method]]
//! name = "x"
//! returns = "int"
//! get_field = "x"
//!
//! [[contract.method]]
//! name = "scale"
//! params = ["double"]
//! returns = "@Point"
//! throws = ["GeometryFailure"]
//! wrap = [{ from = "com.acme.geom.BadScale", to = "GeometryFailure" }]
//!
//! [[contract]]
//! name = "PointCreator"
//! creator = true
//!
//! [[contract.method]]
//! name = "create"
//! params = ["int", "int"]
//! returns = "@Point"
//! constructor = true
//! ```

use std::path::Path;
use std::sync::Arc;

use mirror_sdk::{Contract, ContractMarker, ContractMethod, ContractRegistry, TypeRef};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during manifest parsing
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A type string did not parse
    #[error("Invalid type `{text}` in {contract}.{method}")]
    InvalidType {
        /// Contract name
        contract: String,
        /// Method name
        method: String,
        /// Offending type text
        text: String,
    },

    /// Validation error
    #[error("Invalid manifest: {0}")]
    ValidationError(String),
}

/// Contract manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContractManifest {
    /// `[[contract]]` entries
    #[serde(default, rename = "contract")]
    pub contracts: Vec<ContractEntry>,
}

/// One `[[contract]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractEntry {
    /// Contract name
    pub name: String,

    /// Hidden class this contract mirrors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirrors: Option<String>,

    /// Mirror-creator contract
    #[serde(default)]
    pub creator: bool,

    /// Object factory producing this mirror contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,

    /// `[[contract.method]]` entries
    #[serde(default, rename = "method")]
    pub methods: Vec<MethodEntry>,
}

/// One `[[contract.method]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodEntry {
    /// Method name
    pub name: String,

    /// Parameter types in textual form
    #[serde(default)]
    pub params: Vec<String>,

    /// Return type in textual form (default: "void")
    #[serde(default = "default_returns")]
    pub returns: String,

    /// Field read by this getter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_field: Option<String>,

    /// Field written by this setter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_field: Option<String>,

    /// Constructor method of a creator or factory
    #[serde(default)]
    pub constructor: bool,

    /// Declared failure kinds
    #[serde(default)]
    pub throws: Vec<String>,

    /// Wrap rules in evaluation order
    #[serde(default)]
    pub wrap: Vec<WrapEntry>,
}

/// One `{ from, to }` wrap rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WrapEntry {
    /// Failure kind raised by the hidden member
    pub from: String,
    /// Failure kind raised to the caller
    pub to: String,
}

fn default_returns() -> String {
    "void".to_string()
}

impl ContractManifest {
    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a manifest from a string
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: ContractManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = FxHashSet::default();
        for entry in &self.contracts {
            if entry.name.is_empty() {
                return Err(ManifestError::ValidationError(
                    "Contract name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ManifestError::ValidationError(format!(
                    "Duplicate contract: {}",
                    entry.name
                )));
            }
            entry.marker()?;
            for method in &entry.methods {
                method.validate(&entry.name)?;
            }
        }
        Ok(())
    }

    /// Build the declared contracts
    pub fn to_contracts(&self) -> Result<Vec<Contract>, ManifestError> {
        self.contracts.iter().map(ContractEntry::to_contract).collect()
    }

    /// Build the declared contracts and register them
    pub fn register_into(
        &self,
        registry: &mut ContractRegistry,
    ) -> Result<Vec<Arc<Contract>>, ManifestError> {
        let contracts = self.to_contracts()?;
        Ok(contracts
            .into_iter()
            .map(|contract| registry.register(contract))
            .collect())
    }
}

impl ContractEntry {
    fn marker(&self) -> Result<ContractMarker, ManifestError> {
        match (&self.mirrors, self.creator, &self.factory) {
            (None, false, None) => Ok(ContractMarker::Unmarked),
            (Some(target), false, None) => Ok(ContractMarker::Mirror {
                target: target.clone(),
            }),
            (None, true, None) => Ok(ContractMarker::Creator),
            (None, false, Some(mirror)) => Ok(ContractMarker::Factory {
                mirror: mirror.clone(),
            }),
            _ => Err(ManifestError::ValidationError(format!(
                "Contract {} sets more than one of `mirrors`, `creator` and `factory`",
                self.name
            ))),
        }
    }

    /// Build the contract
    pub fn to_contract(&self) -> Result<Contract, ManifestError> {
        let mut contract = Contract::new(self.name.clone(), self.marker()?);
        for method in &self.methods {
            contract = contract.method(method.to_method(&self.name)?);
        }
        Ok(contract)
    }
}

impl MethodEntry {
    fn validate(&self, contract: &str) -> Result<(), ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::ValidationError(format!(
                "Method name cannot be empty in contract {}",
                contract
            )));
        }
        let roles = usize::from(self.get_field.is_some())
            + usize::from(self.set_field.is_some())
            + usize::from(self.constructor);
        if roles > 1 {
            return Err(ManifestError::ValidationError(format!(
                "Method {}.{} sets more than one of `get_field`, `set_field` and `constructor`",
                contract, self.name
            )));
        }
        Ok(())
    }

    fn parse_type(&self, contract: &str, text: &str) -> Result<TypeRef, ManifestError> {
        TypeRef::parse(text).ok_or_else(|| ManifestError::InvalidType {
            contract: contract.to_string(),
            method: self.name.clone(),
            text: text.to_string(),
        })
    }

    /// Build the contract method
    pub fn to_method(&self, contract: &str) -> Result<ContractMethod, ManifestError> {
        let params = self
            .params
            .iter()
            .map(|text| self.parse_type(contract, text))
            .collect::<Result<Vec<_>, _>>()?;
        let mut method = ContractMethod::new(self.name.clone())
            .params(params)
            .returns(self.parse_type(contract, &self.returns)?);

        if let Some(field) = &self.get_field {
            method = method.get_field(field.clone());
        }
        if let Some(field) = &self.set_field {
            method = method.set_field(field.clone());
        }
        if self.constructor {
            method = method.constructor();
        }
        for kind in &self.throws {
            method = method.throws(kind.clone());
        }
        for rule in &self.wrap {
            method = method.wrap(rule.from.clone(), rule.to.clone());
        }
        Ok(method)
    }
}
