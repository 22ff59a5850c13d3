//! Proxy objects
//!
//! A proxy is a runtime object implementing a [`Contract`]. It has no
//! behavior of its own: every call is routed to the [`InvocationHandler`] the
//! proxy was created with, together with the selected contract method and the
//! call arguments.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let proxy = factory.create(contract, Arc::new(MyHandler));
//! let length = proxy.call("length", &[])?;
//!
//! // Recover the concrete handler type
//! if let Some(handler) = proxy.handler_as::<MyHandler>() {
//!     // ...
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::contract::{Contract, ContractMethod};
use crate::error::{MirrorError, MirrorResult};
use crate::value::Value;

/// Receives every call made against a proxy
pub trait InvocationHandler: Send + Sync + 'static {
    /// Handle a call of `method` with `args` against `proxy`
    fn invoke(
        &self,
        proxy: &Proxy,
        method: &ContractMethod,
        args: &[Value],
    ) -> MirrorResult<Value>;

    /// The handler as `Any`, so callers can recognize their own handlers
    fn as_any(&self) -> &dyn Any;
}

struct ProxyInner {
    id: u64,
    contract: Arc<Contract>,
    handler: Arc<dyn InvocationHandler>,
}

/// Runtime implementation of a contract
///
/// Clones share identity: two `Proxy` values are equal only if they come from
/// the same `ProxyFactory::create` call.
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

impl Proxy {
    /// Build a proxy directly; factories use this after assigning an id
    pub fn new(id: u64, contract: Arc<Contract>, handler: Arc<dyn InvocationHandler>) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                id,
                contract,
                handler,
            }),
        }
    }

    /// Unique id assigned by the factory
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Implemented contract
    pub fn contract(&self) -> &Arc<Contract> {
        &self.inner.contract
    }

    /// Handler receiving the calls
    pub fn handler(&self) -> &Arc<dyn InvocationHandler> {
        &self.inner.handler
    }

    /// The handler, if it is a `H`
    pub fn handler_as<H: InvocationHandler>(&self) -> Option<&H> {
        self.inner.handler.as_any().downcast_ref::<H>()
    }

    /// Call a contract method by name, choosing the overload that accepts
    /// `args`
    pub fn call(&self, name: &str, args: &[Value]) -> MirrorResult<Value> {
        let method = self.inner.contract.select_method(name, args)?;
        self.inner.handler.invoke(self, method, args)
    }

    /// Call an already selected contract method
    ///
    /// `method` must be taken from this proxy's contract; a method built
    /// elsewhere is rejected even if it shares a name with a declared one.
    pub fn invoke(&self, method: &ContractMethod, args: &[Value]) -> MirrorResult<Value> {
        if !self.inner.contract.declares(method) {
            return Err(MirrorError::IllegalArgument(format!(
                "{} is not declared by contract {}",
                method.signature(),
                self.inner.contract.name()
            )));
        }
        self.inner.handler.invoke(self, method, args)
    }

    /// Check if both handles refer to the same proxy
    pub fn ptr_eq(&self, other: &Proxy) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.inner.id)
            .field("contract", &self.inner.contract.name())
            .finish()
    }
}

/// Creates proxies for contracts
pub trait ProxyFactory: Send + Sync {
    /// Create a proxy implementing `contract` that routes calls to `handler`
    fn create(&self, contract: Arc<Contract>, handler: Arc<dyn InvocationHandler>) -> Proxy;
}

/// Factory assigning sequential ids starting at 1
#[derive(Debug)]
pub struct DefaultProxyFactory {
    next_id: AtomicU64,
}

impl DefaultProxyFactory {
    /// Create a factory
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for DefaultProxyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyFactory for DefaultProxyFactory {
    fn create(&self, contract: Arc<Contract>, handler: Arc<dyn InvocationHandler>) -> Proxy {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Proxy::new(id, contract, handler)
    }
}
