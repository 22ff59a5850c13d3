//! Contract validation
//!
//! Checks run once, when a mirror, creator or factory is built, so that a
//! malformed contract fails at creation time instead of at some later call.

use std::sync::Arc;

use mirror_sdk::{
    Contract, ContractMarker, ContractMethod, FailureRegistry, MemberRole, MirrorError,
    MirrorResult, TypeRef,
};

use crate::metadata::ContractMetadata;

/// Eager well-formedness checks for contracts
#[derive(Debug, Clone)]
pub struct ContractValidator {
    metadata: ContractMetadata,
    failures: Arc<FailureRegistry>,
}

fn invalid(contract: &Contract, message: impl std::fmt::Display) -> MirrorError {
    MirrorError::Configuration(format!("{}: {}", contract.name(), message))
}

fn invalid_member(contract: &Contract, method: &ContractMethod, message: &str) -> MirrorError {
    MirrorError::Configuration(format!(
        "{}.{}: {}",
        contract.name(),
        method.signature(),
        message
    ))
}

impl ContractValidator {
    /// Create a validator
    pub fn new(metadata: ContractMetadata, failures: Arc<FailureRegistry>) -> Self {
        Self { metadata, failures }
    }

    /// Validate according to the contract's own marker
    pub fn validate(&self, contract: &Contract) -> MirrorResult<()> {
        match contract.marker() {
            ContractMarker::Unmarked => Err(invalid(
                contract,
                "not marked as a mirror, mirror creator or object factory",
            )),
            ContractMarker::Mirror { .. } => self.validate_mirror(contract),
            ContractMarker::Creator => self.validate_creator(contract),
            ContractMarker::Factory { .. } => self.validate_factory(contract),
        }
    }

    /// Validate a mirror contract
    pub fn validate_mirror(&self, contract: &Contract) -> MirrorResult<()> {
        if !self.metadata.is_mirror_contract(contract) {
            return Err(invalid(
                contract,
                format_args!("expected a mirror contract, found {}", contract.marker().kind()),
            ));
        }
        self.metadata.target_class_of(contract)?;

        for method in contract.methods() {
            self.validate_common(contract, method)?;
            match method.role() {
                MemberRole::Method => {}
                MemberRole::GetField(_) => {
                    if !method.param_types().is_empty() {
                        return Err(invalid_member(
                            contract,
                            method,
                            "a getter takes no parameters",
                        ));
                    }
                    if method.return_type().is_void() {
                        return Err(invalid_member(
                            contract,
                            method,
                            "a getter must return a value",
                        ));
                    }
                }
                MemberRole::SetField(_) => {
                    if method.param_types().len() != 1 {
                        return Err(invalid_member(
                            contract,
                            method,
                            "a setter takes exactly one parameter",
                        ));
                    }
                    if !method.return_type().is_void() {
                        return Err(invalid_member(contract, method, "a setter returns nothing"));
                    }
                }
                MemberRole::Constructor => {
                    return Err(invalid_member(
                        contract,
                        method,
                        "constructor members belong on mirror creator or object factory contracts",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Validate a mirror-creator contract
    pub fn validate_creator(&self, contract: &Contract) -> MirrorResult<()> {
        if !self.metadata.is_creator_contract(contract) {
            return Err(invalid(
                contract,
                format_args!("expected a mirror creator, found {}", contract.marker().kind()),
            ));
        }
        for method in contract.methods() {
            self.validate_common(contract, method)?;
            self.require_constructor(contract, method)?;
            let target = self.metadata.creator_target_contract(method)?;
            self.metadata.target_class_of(&target)?;
        }
        Ok(())
    }

    /// Validate an object-factory contract
    pub fn validate_factory(&self, contract: &Contract) -> MirrorResult<()> {
        let mirror = self.metadata.factory_mirror_contract(contract)?;
        self.metadata.target_class_of(&mirror)?;
        let expected = TypeRef::contract(mirror.name());

        for method in contract.methods() {
            self.validate_common(contract, method)?;
            self.require_constructor(contract, method)?;
            if method.return_type() != &expected {
                return Err(invalid_member(
                    contract,
                    method,
                    &format!("must return {}", expected),
                ));
            }
        }
        Ok(())
    }

    fn require_constructor(
        &self,
        contract: &Contract,
        method: &ContractMethod,
    ) -> MirrorResult<()> {
        if method.role() == MemberRole::Constructor {
            Ok(())
        } else {
            Err(invalid_member(
                contract,
                method,
                "every member of a creator or factory must be marked as a constructor",
            ))
        }
    }

    /// Checks shared by every contract flavor
    fn validate_common(&self, contract: &Contract, method: &ContractMethod) -> MirrorResult<()> {
        if method.is_ambiguous() {
            let roles: Vec<String> = method.role_markers().iter().map(|r| r.to_string()).collect();
            return Err(invalid_member(
                contract,
                method,
                &format!("ambiguous member role ({})", roles.join(", ")),
            ));
        }

        for ty in method.param_types().iter().chain([method.return_type()]) {
            self.validate_type(contract, method, ty)?;
        }

        let kinds = method
            .declared_failures()
            .iter()
            .chain(method.wrap_rules().iter().flat_map(|rule| [&rule.from, &rule.to]));
        for kind in kinds {
            if !self.failures.contains(kind) {
                return Err(invalid_member(
                    contract,
                    method,
                    &format!("unknown failure kind {}", kind),
                ));
            }
        }
        Ok(())
    }

    /// Every contract a signature mentions must be a registered mirror
    fn validate_type(
        &self,
        contract: &Contract,
        method: &ContractMethod,
        ty: &TypeRef,
    ) -> MirrorResult<()> {
        match ty {
            TypeRef::Array(component) => self.validate_type(contract, method, component),
            TypeRef::Contract(name) if !self.metadata.is_mirror_type(name) => Err(invalid_member(
                contract,
                method,
                &format!("@{} is not a registered mirror contract", name),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_sdk::{ClassBuilder, ClassRegistry, ContractRegistry};

    fn validator(contracts: Vec<Contract>) -> ContractValidator {
        let mut classes = ClassRegistry::new();
        classes.define(ClassBuilder::new("test.Point"));
        let mut registry = ContractRegistry::new();
        registry.register(Contract::mirror("Point", "test.Point"));
        for contract in contracts {
            registry.register(contract);
        }
        let metadata = ContractMetadata::new(Arc::new(registry), Arc::new(classes));
        ContractValidator::new(metadata, Arc::new(FailureRegistry::new()))
    }

    fn check(contract: Contract) -> MirrorResult<()> {
        validator(vec![contract.clone()]).validate(&contract)
    }

    fn is_config_error(result: MirrorResult<()>) -> bool {
        matches!(result, Err(MirrorError::Configuration(_)))
    }

    #[test]
    fn test_valid_mirror() {
        let point = Contract::mirror("Point2", "test.Point")
            .method(ContractMethod::new("x").returns(TypeRef::I32).get_field("x"))
            .method(ContractMethod::new("x").param(TypeRef::I32).set_field("x"))
            .method(
                ContractMethod::new("plus")
                    .param(TypeRef::contract("Point"))
                    .returns(TypeRef::array_of(TypeRef::contract("Point")))
                    .throws("Exception")
                    .wrap("RuntimeException", "Exception"),
            );
        assert!(check(point).is_ok());
    }

    #[test]
    fn test_unmarked_contract() {
        assert!(is_config_error(check(Contract::unmarked("Plain"))));
    }

    #[test]
    fn test_missing_target_class() {
        let ghost = Contract::mirror("Ghost", "test.Missing");
        assert!(matches!(check(ghost), Err(MirrorError::ClassNotFound(_))));
    }

    #[test]
    fn test_getter_and_setter_shapes() {
        let bad_getter = Contract::mirror("P", "test.Point").method(
            ContractMethod::new("x")
                .param(TypeRef::I32)
                .returns(TypeRef::I32)
                .get_field("x"),
        );
        assert!(is_config_error(check(bad_getter)));

        let void_getter =
            Contract::mirror("P", "test.Point").method(ContractMethod::new("x").get_field("x"));
        assert!(is_config_error(check(void_getter)));

        let bad_setter = Contract::mirror("P", "test.Point").method(
            ContractMethod::new("x")
                .param(TypeRef::I32)
                .returns(TypeRef::I32)
                .set_field("x"),
        );
        assert!(is_config_error(check(bad_setter)));
    }

    #[test]
    fn test_ambiguous_role() {
        let ambiguous = Contract::mirror("P", "test.Point").method(
            ContractMethod::new("x")
                .returns(TypeRef::I32)
                .get_field("x")
                .constructor(),
        );
        assert!(is_config_error(check(ambiguous)));
    }

    #[test]
    fn test_constructor_on_mirror() {
        let mirror = Contract::mirror("P", "test.Point").method(
            ContractMethod::new("create")
                .returns(TypeRef::contract("Point"))
                .constructor(),
        );
        assert!(is_config_error(check(mirror)));
    }

    #[test]
    fn test_creator_members() {
        let good = Contract::creator("C").method(
            ContractMethod::new("create")
                .param(TypeRef::I32)
                .returns(TypeRef::contract("Point"))
                .constructor(),
        );
        assert!(check(good).is_ok());

        let unmarked_member = Contract::creator("C")
            .method(ContractMethod::new("create").returns(TypeRef::contract("Point")));
        assert!(is_config_error(check(unmarked_member)));

        let raw_return = Contract::creator("C").method(
            ContractMethod::new("create")
                .returns(TypeRef::class("test.Point"))
                .constructor(),
        );
        assert!(is_config_error(check(raw_return)));
    }

    #[test]
    fn test_factory_members() {
        let good = Contract::factory("F", "Point").method(
            ContractMethod::new("make")
                .returns(TypeRef::contract("Point"))
                .constructor(),
        );
        assert!(check(good).is_ok());

        let other_return = Contract::factory("F", "Point").method(
            ContractMethod::new("make")
                .returns(TypeRef::contract("F"))
                .constructor(),
        );
        assert!(is_config_error(check(other_return)));

        let unknown_mirror = Contract::factory("F", "Nothing");
        assert!(is_config_error(check(unknown_mirror)));
    }

    #[test]
    fn test_unknown_types_and_failures() {
        let unknown_contract = Contract::mirror("P", "test.Point")
            .method(ContractMethod::new("f").param(TypeRef::contract("Nothing")));
        assert!(is_config_error(check(unknown_contract)));

        let unknown_failure = Contract::mirror("P", "test.Point")
            .method(ContractMethod::new("f").wrap("Exception", "NoSuchFailure"));
        assert!(is_config_error(check(unknown_failure)));
    }

    #[test]
    fn test_flavor_mismatch() {
        let creator = Contract::creator("C");
        let validator = validator(vec![creator.clone()]);
        assert!(is_config_error(validator.validate_mirror(&creator)));
        assert!(is_config_error(validator.validate_factory(&creator)));
        assert!(validator.validate_creator(&creator).is_ok());
    }
}
