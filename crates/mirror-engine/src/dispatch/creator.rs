//! Mirror-creator handler

use std::any::Any;
use std::sync::Arc;

use mirror_sdk::{
    Contract, ContractMethod, InvocationHandler, MemberRole, MirrorError, MirrorResult, Proxy,
    Value,
};

use super::{construct, finish};
use crate::engine::EngineShared;

/// Handler behind a mirror-creator contract.
///
/// Not bound to any instance: each constructor method names the mirror
/// contract it produces through its return type, and the hidden class comes
/// from that contract.
pub struct MirrorCreatorInvocationHandler {
    shared: Arc<EngineShared>,
}

impl MirrorCreatorInvocationHandler {
    pub(crate) fn new(shared: Arc<EngineShared>) -> Self {
        Self { shared }
    }

    fn dispatch(
        &self,
        contract: &Contract,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value> {
        if method.role() != MemberRole::Constructor {
            return Err(MirrorError::Configuration(format!(
                "{} on mirror creator {} is not marked as a constructor",
                method.signature(),
                contract.name()
            )));
        }
        let target = self.shared.metadata().creator_target_contract(method)?;
        let class = self.shared.mirror_binding(&target)?;
        construct(&self.shared, contract, method, &class, args)
    }
}

impl InvocationHandler for MirrorCreatorInvocationHandler {
    fn invoke(
        &self,
        proxy: &Proxy,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value> {
        let contract = proxy.contract();
        tracing::trace!(
            target: "mirror::dispatch",
            "creator #{} {}.{}",
            proxy.id(),
            contract.name(),
            method.signature()
        );
        let outcome = self.dispatch(contract, method, args);
        finish(&self.shared, contract, method, outcome)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
