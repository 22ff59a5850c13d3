//! Member resolution
//!
//! Finds the hidden method, field or constructor a contract method refers to.
//! Methods and fields are searched through the whole class lineage, most
//! derived class first, regardless of visibility. Constructors are never
//! inherited. Overloads are told apart by exact equality of the unwrapped
//! parameter types; no widening or boxing is attempted.
//!
//! Resolutions are memoized per (contract, method signature, role, target
//! class) when the cache is enabled. The mapping never changes once
//! registries are built.

use std::sync::Arc;

use dashmap::DashMap;
use mirror_sdk::{
    types::signature_string, ClassDescriptor, ConstructorRef, Contract, ContractMethod, FieldRef,
    MemberRole, MethodRef, MirrorError, MirrorResult,
};

use crate::marshal::Unwrapper;

/// A resolved hidden member, tagged with how the contract method uses it
#[derive(Debug, Clone)]
pub enum ResolvedMember {
    /// Plain method call
    Method(MethodRef),
    /// Field read
    Getter(FieldRef),
    /// Field write
    Setter(FieldRef),
    /// Constructor call
    Constructor(ConstructorRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolveKey {
    contract: String,
    signature: String,
    role: MemberRole,
    class: String,
}

/// Resolves contract methods to hidden members
#[derive(Debug)]
pub struct MemberResolver {
    unwrapper: Unwrapper,
    cache: Option<DashMap<ResolveKey, ResolvedMember>>,
}

impl MemberResolver {
    /// Create a resolver; `cache_members` enables memoization
    pub fn new(unwrapper: Unwrapper, cache_members: bool) -> Self {
        Self {
            unwrapper,
            cache: cache_members.then(DashMap::new),
        }
    }

    /// Number of memoized resolutions
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }

    /// Resolve `method` of `contract` against `class` according to its role
    pub fn resolve(
        &self,
        contract: &Contract,
        method: &ContractMethod,
        class: &Arc<ClassDescriptor>,
    ) -> MirrorResult<ResolvedMember> {
        let key = self.cache.as_ref().map(|_| ResolveKey {
            contract: contract.name().to_string(),
            signature: method.signature(),
            role: method.role(),
            class: class.name().to_string(),
        });
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                tracing::trace!(
                    target: "mirror::resolve",
                    "cache hit for {}.{} on {}",
                    contract.name(),
                    method.signature(),
                    class.name()
                );
                return Ok(hit.clone());
            }
        }

        let resolved = match method.role() {
            MemberRole::Method => ResolvedMember::Method(self.find_method(method, class)?),
            MemberRole::GetField(field) => ResolvedMember::Getter(self.find_field(&field, class)?),
            MemberRole::SetField(field) => ResolvedMember::Setter(self.find_field(&field, class)?),
            MemberRole::Constructor => {
                ResolvedMember::Constructor(self.find_constructor(method, class)?)
            }
        };
        tracing::debug!(
            target: "mirror::resolve",
            "resolved {}.{} on {} as {}",
            contract.name(),
            method.signature(),
            class.name(),
            method.role()
        );

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(key, resolved.clone());
        }
        Ok(resolved)
    }

    /// Find the hidden method with the contract method's name and unwrapped
    /// parameter types
    pub fn find_method(
        &self,
        method: &ContractMethod,
        class: &Arc<ClassDescriptor>,
    ) -> MirrorResult<MethodRef> {
        let params = self.unwrapper.unwrap_types(method.param_types())?;
        class
            .lineage()
            .find_map(|owner| {
                owner
                    .declared_method_index(method.name(), &params)
                    .and_then(|index| owner.method_ref(index))
            })
            .ok_or_else(|| {
                MirrorError::NoSuchMember(format!(
                    "{}.{}{}",
                    class.name(),
                    method.name(),
                    signature_string(&params)
                ))
            })
    }

    /// Find the hidden field with this name
    pub fn find_field(&self, field: &str, class: &Arc<ClassDescriptor>) -> MirrorResult<FieldRef> {
        class
            .lineage()
            .find_map(|owner| {
                owner
                    .declared_field_index(field)
                    .and_then(|index| owner.field_ref(index))
            })
            .ok_or_else(|| MirrorError::NoSuchMember(format!("{}.{}", class.name(), field)))
    }

    /// Find the hidden constructor with the contract method's unwrapped
    /// parameter types
    pub fn find_constructor(
        &self,
        method: &ContractMethod,
        class: &Arc<ClassDescriptor>,
    ) -> MirrorResult<ConstructorRef> {
        let params = self.unwrapper.unwrap_types(method.param_types())?;
        class
            .declared_constructor_index(&params)
            .and_then(|index| class.constructor_ref(index))
            .ok_or_else(|| {
                MirrorError::NoSuchMember(format!(
                    "{}.<init>{}",
                    class.name(),
                    signature_string(&params)
                ))
            })
    }
}
