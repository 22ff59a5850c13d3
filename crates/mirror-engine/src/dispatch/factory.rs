//! Object-factory handler

use std::any::Any;
use std::sync::Arc;

use mirror_sdk::{
    ClassDescriptor, Contract, ContractMethod, InvocationHandler, MemberRole, MirrorError,
    MirrorResult, Proxy, Value,
};

use super::{construct, finish};
use crate::engine::EngineShared;

/// Handler behind an object-factory contract, fixed to one hidden class and
/// the mirror contract its results are wrapped in
pub struct ObjectFactoryInvocationHandler {
    shared: Arc<EngineShared>,
    mirror: Arc<Contract>,
    class: Arc<ClassDescriptor>,
}

impl ObjectFactoryInvocationHandler {
    pub(crate) fn new(
        shared: Arc<EngineShared>,
        mirror: Arc<Contract>,
        class: Arc<ClassDescriptor>,
    ) -> Self {
        Self {
            shared,
            mirror,
            class,
        }
    }

    /// Mirror contract every product is wrapped in
    pub fn mirror_contract(&self) -> &Arc<Contract> {
        &self.mirror
    }

    /// Hidden class being constructed
    pub fn target_class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    fn dispatch(
        &self,
        contract: &Contract,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value> {
        if method.role() != MemberRole::Constructor {
            return Err(MirrorError::Configuration(format!(
                "{} on object factory {} is not marked as a constructor",
                method.signature(),
                contract.name()
            )));
        }
        construct(&self.shared, contract, method, &self.class, args)
    }
}

impl InvocationHandler for ObjectFactoryInvocationHandler {
    fn invoke(
        &self,
        proxy: &Proxy,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value> {
        let contract = proxy.contract();
        tracing::trace!(
            target: "mirror::dispatch",
            "factory #{} {}.{} -> {}",
            proxy.id(),
            contract.name(),
            method.signature(),
            self.mirror.name()
        );
        let outcome = self.dispatch(contract, method, args);
        finish(&self.shared, contract, method, outcome)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
