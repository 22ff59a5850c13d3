//! Instance mirror handler

use std::any::Any;
use std::sync::Arc;

use mirror_sdk::{
    ClassDescriptor, Contract, ContractMethod, InvocationHandler, MemberRole, MirrorError,
    MirrorResult, ObjectRef, Proxy, Value,
};

use super::finish;
use crate::engine::EngineShared;
use crate::resolve::ResolvedMember;

/// Handler behind a mirror instance, bound to one target object
pub struct MirrorInvocationHandler {
    shared: Arc<EngineShared>,
    class: Arc<ClassDescriptor>,
    target: ObjectRef,
}

impl MirrorInvocationHandler {
    pub(crate) fn new(
        shared: Arc<EngineShared>,
        class: Arc<ClassDescriptor>,
        target: ObjectRef,
    ) -> Self {
        Self {
            shared,
            class,
            target,
        }
    }

    /// The bound target instance
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    /// The class the contract mirrors
    pub fn target_class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    fn dispatch(
        &self,
        contract: &Contract,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value> {
        match method.role() {
            MemberRole::Constructor => {
                return Err(MirrorError::Configuration(format!(
                    "constructor member {} on mirror contract {}",
                    method.signature(),
                    contract.name()
                )))
            }
            MemberRole::SetField(field) if args.len() != 1 => {
                return Err(MirrorError::IllegalArgument(format!(
                    "setter of `{}` takes exactly one argument, got {}",
                    field,
                    args.len()
                )))
            }
            MemberRole::GetField(field) if !args.is_empty() => {
                return Err(MirrorError::IllegalArgument(format!(
                    "getter of `{}` takes no arguments, got {}",
                    field,
                    args.len()
                )))
            }
            _ => {}
        }

        let shared = &self.shared;
        let permission = shared.permission_for(&self.class);
        match shared.resolver().resolve(contract, method, &self.class)? {
            ResolvedMember::Method(target_method) => {
                let receiver = (!target_method.is_static()).then_some(&self.target);
                let args = shared.unwrapper().unwrap_args(args)?;
                let raw = target_method.invoke(shared.classes(), permission, receiver, &args)?;
                shared.wrapper().wrap(&**shared, raw, method.return_type())
            }
            ResolvedMember::Getter(field) => {
                let receiver = (!field.is_static()).then_some(&self.target);
                let raw = field.get(permission, receiver)?;
                shared.wrapper().wrap(&**shared, raw, method.return_type())
            }
            ResolvedMember::Setter(field) => {
                let receiver = (!field.is_static()).then_some(&self.target);
                let value = shared.unwrapper().unwrap_value(&args[0])?;
                field.set(permission, receiver, value)?;
                Ok(Value::Null)
            }
            ResolvedMember::Constructor(_) => Err(MirrorError::Configuration(format!(
                "constructor member {} on mirror contract {}",
                method.signature(),
                contract.name()
            ))),
        }
    }
}

impl InvocationHandler for MirrorInvocationHandler {
    fn invoke(
        &self,
        proxy: &Proxy,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value> {
        let contract = proxy.contract();
        tracing::trace!(
            target: "mirror::dispatch",
            "mirror #{} {}.{} -> {}",
            proxy.id(),
            contract.name(),
            method.signature(),
            method.role()
        );
        let outcome = self.dispatch(contract, method, args);
        finish(&self.shared, contract, method, outcome)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
