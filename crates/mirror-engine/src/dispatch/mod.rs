//! Invocation dispatch
//!
//! Every call against a mirror proxy lands in one of three handlers:
//!
//! - [`MirrorInvocationHandler`]: bound to one target instance; reads and
//!   writes fields and calls methods on it
//! - [`MirrorCreatorInvocationHandler`]: calls hidden constructors, taking
//!   the mirror contract to produce from each method's return type
//! - [`ObjectFactoryInvocationHandler`]: calls hidden constructors of one
//!   fixed class and mirror contract
//!
//! ## Per-call steps
//!
//! 1. Classify the contract method by its role
//! 2. Resolve the hidden member (memoized when enabled)
//! 3. Bind the target instance, or none for static members
//! 4. Unwrap arguments and invoke under the permission held for the class
//! 5. Wrap the result against the declared return type
//!
//! Failures raised by the hidden member go through the failure translator.
//! Everything else (no such member, access denied, conversion failure) is a
//! contract defect. It surfaces as [`MirrorError::FieldAccess`] for getters
//! and setters and as [`MirrorError::Invocation`] for the other members.

mod creator;
mod factory;
mod mirror;

pub use creator::MirrorCreatorInvocationHandler;
pub use factory::ObjectFactoryInvocationHandler;
pub use mirror::MirrorInvocationHandler;

use std::sync::Arc;

use mirror_sdk::{
    ClassDescriptor, Contract, ContractMethod, MemberRole, MirrorError, MirrorResult, Value,
};

use crate::engine::EngineShared;
use crate::resolve::ResolvedMember;

/// Route the outcome of a dispatched call to the caller
fn finish(
    shared: &EngineShared,
    contract: &Contract,
    method: &ContractMethod,
    outcome: MirrorResult<Value>,
) -> MirrorResult<Value> {
    match outcome {
        Ok(value) => Ok(value),
        Err(MirrorError::Thrown(failure)) => Err(shared.translator().translate(method, failure)),
        Err(error) => {
            tracing::debug!(
                target: "mirror::dispatch",
                "{}.{} failed: {}",
                contract.name(),
                method.signature(),
                error
            );
            let member = format!("{}.{}", contract.name(), method.signature());
            Err(match method.role() {
                MemberRole::GetField(_) | MemberRole::SetField(_) => {
                    MirrorError::field_access(member, error)
                }
                _ => MirrorError::invocation(member, error),
            })
        }
    }
}

/// Call the hidden constructor `method` maps to on `class` and wrap the new
/// object against the method's declared return type
fn construct(
    shared: &EngineShared,
    contract: &Contract,
    method: &ContractMethod,
    class: &Arc<ClassDescriptor>,
    args: &[Value],
) -> MirrorResult<Value> {
    let constructor = match shared.resolver().resolve(contract, method, class)? {
        ResolvedMember::Constructor(constructor) => constructor,
        _ => {
            return Err(MirrorError::Configuration(format!(
                "{} is not marked as a constructor",
                method.signature()
            )))
        }
    };
    let args = shared.unwrapper().unwrap_args(args)?;
    let instance = constructor.new_instance(
        shared.classes(),
        shared.permission_for(class),
        &args,
    )?;
    tracing::trace!(
        target: "mirror::dispatch",
        "constructed {} through {}.{}",
        class.name(),
        contract.name(),
        method.signature()
    );
    shared
        .wrapper()
        .wrap(shared, Value::Object(instance), method.return_type())
}
