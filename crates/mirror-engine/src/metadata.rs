//! Contract metadata resolver
//!
//! Pure lookups over the contract and class registries: what kind of contract
//! a name refers to, and which hidden class a mirror contract targets.

use std::sync::Arc;

use mirror_sdk::{
    ClassDescriptor, ClassRegistry, Contract, ContractMarker, ContractMethod, ContractRegistry,
    MirrorError, MirrorResult, TypeRef,
};

/// Read-only view of the registries a mirror engine works against
#[derive(Debug, Clone)]
pub struct ContractMetadata {
    contracts: Arc<ContractRegistry>,
    classes: Arc<ClassRegistry>,
}

impl ContractMetadata {
    /// Create a resolver over the given registries
    pub fn new(contracts: Arc<ContractRegistry>, classes: Arc<ClassRegistry>) -> Self {
        Self { contracts, classes }
    }

    /// Contract registry
    pub fn contracts(&self) -> &Arc<ContractRegistry> {
        &self.contracts
    }

    /// Class registry
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// Look up a contract by name.
    ///
    /// Naming a class instead of a contract is a configuration error.
    pub fn contract(&self, name: &str) -> MirrorResult<Arc<Contract>> {
        if let Some(contract) = self.contracts.get(name) {
            return Ok(Arc::clone(contract));
        }
        if self.classes.contains(name) {
            return Err(MirrorError::Configuration(format!(
                "{} is a class, not a contract interface",
                name
            )));
        }
        Err(MirrorError::Configuration(format!("unknown contract {}", name)))
    }

    /// Check if `contract` is marked as a mirror of some class
    pub fn is_mirror_contract(&self, contract: &Contract) -> bool {
        matches!(contract.marker(), ContractMarker::Mirror { .. })
    }

    /// Check if the named type is a registered mirror contract
    pub fn is_mirror_type(&self, name: &str) -> bool {
        self.contracts
            .get(name)
            .is_some_and(|contract| self.is_mirror_contract(contract))
    }

    /// Name of the hidden class a mirror contract targets
    pub fn mirrored_type_name_of<'a>(&self, contract: &'a Contract) -> MirrorResult<&'a str> {
        match contract.marker() {
            ContractMarker::Mirror { target } => Ok(target.as_str()),
            other => Err(MirrorError::Configuration(format!(
                "{} is not a mirror contract (marked {})",
                contract.name(),
                other.kind()
            ))),
        }
    }

    /// Check if `contract` is a mirror-creator contract
    pub fn is_creator_contract(&self, contract: &Contract) -> bool {
        matches!(contract.marker(), ContractMarker::Creator)
    }

    /// Check if `contract` is an object-factory contract
    pub fn is_factory_contract(&self, contract: &Contract) -> bool {
        matches!(contract.marker(), ContractMarker::Factory { .. })
    }

    /// Mirror contract a creator method constructs, taken from its return type
    pub fn creator_target_contract(&self, method: &ContractMethod) -> MirrorResult<Arc<Contract>> {
        match method.return_type() {
            TypeRef::Contract(name) => {
                let contract = self.contract(name)?;
                self.mirrored_type_name_of(&contract)?;
                Ok(contract)
            }
            other => Err(MirrorError::Configuration(format!(
                "constructor method {} must return a mirror contract, not {}",
                method.signature(),
                other
            ))),
        }
    }

    /// Mirror contract an object-factory contract produces
    pub fn factory_mirror_contract(&self, factory: &Contract) -> MirrorResult<Arc<Contract>> {
        match factory.marker() {
            ContractMarker::Factory { mirror } => {
                let contract = self.contract(mirror)?;
                self.mirrored_type_name_of(&contract)?;
                Ok(contract)
            }
            other => Err(MirrorError::Configuration(format!(
                "{} is not an object factory contract (marked {})",
                factory.name(),
                other.kind()
            ))),
        }
    }

    /// Hidden class a mirror contract targets, loaded from the class registry
    pub fn target_class_of(&self, contract: &Contract) -> MirrorResult<Arc<ClassDescriptor>> {
        let target = self.mirrored_type_name_of(contract)?;
        self.classes.load(target)
    }
}
