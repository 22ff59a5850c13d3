//! Mirror engine and entry operations
//!
//! A [`MirrorEngine`] owns the registries and every collaborator a dispatched
//! call needs. Creating a mirror, creator or factory validates the contract
//! once and hands back a [`Proxy`]; calls against it then run through the
//! dispatch handlers without further validation.

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use mirror_sdk::{
    ClassDescriptor, ClassRegistry, Contract, ContractRegistry, DefaultProxyFactory,
    FailureRegistry, MirrorError, MirrorResult, ObjectRef, PermissionPolicy, Proxy, ProxyFactory,
    ReflectionPermission,
};

use crate::config::EngineConfig;
use crate::dispatch::{
    MirrorCreatorInvocationHandler, MirrorInvocationHandler, ObjectFactoryInvocationHandler,
};
use crate::failure::FailureTranslator;
use crate::manifest::{ContractManifest, ManifestError};
use crate::marshal::{MirrorSpawner, Unwrapper, Wrapper};
use crate::metadata::ContractMetadata;
use crate::resolve::MemberResolver;
use crate::validation::ContractValidator;

/// State shared by the engine and every handler it creates
pub(crate) struct EngineShared {
    this: Weak<EngineShared>,
    metadata: ContractMetadata,
    failures: Arc<FailureRegistry>,
    config: EngineConfig,
    policy: PermissionPolicy,
    validator: ContractValidator,
    unwrapper: Unwrapper,
    wrapper: Wrapper,
    resolver: MemberResolver,
    translator: FailureTranslator,
    proxies: Arc<dyn ProxyFactory>,
    /// Validated mirror contracts and the class each one targets
    bindings: DashMap<String, Arc<ClassDescriptor>>,
}

impl EngineShared {
    pub(crate) fn metadata(&self) -> &ContractMetadata {
        &self.metadata
    }

    pub(crate) fn classes(&self) -> &ClassRegistry {
        self.metadata.classes()
    }

    pub(crate) fn unwrapper(&self) -> &Unwrapper {
        &self.unwrapper
    }

    pub(crate) fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    pub(crate) fn resolver(&self) -> &MemberResolver {
        &self.resolver
    }

    pub(crate) fn translator(&self) -> &FailureTranslator {
        &self.translator
    }

    /// Permission held when reaching into `class`
    pub(crate) fn permission_for(&self, class: &Arc<ClassDescriptor>) -> ReflectionPermission {
        self.policy.resolve(class.name())
    }

    /// Validate a mirror contract once and return the class it targets
    pub(crate) fn mirror_binding(&self, contract: &Contract) -> MirrorResult<Arc<ClassDescriptor>> {
        if let Some(class) = self.bindings.get(contract.name()) {
            return Ok(Arc::clone(class.value()));
        }
        self.validator.validate_mirror(contract)?;
        let class = self.metadata.target_class_of(contract)?;
        tracing::debug!(
            target: "mirror::engine",
            "bound mirror contract {} to {}",
            contract.name(),
            class.name()
        );
        self.bindings
            .insert(contract.name().to_string(), Arc::clone(&class));
        Ok(class)
    }

    fn shared(&self) -> MirrorResult<Arc<EngineShared>> {
        self.this
            .upgrade()
            .ok_or_else(|| MirrorError::Configuration("mirror engine was dropped".to_string()))
    }

    /// Build the proxy for an already validated binding
    fn bind(
        &self,
        contract: &Arc<Contract>,
        class: &Arc<ClassDescriptor>,
        target: ObjectRef,
    ) -> MirrorResult<Proxy> {
        if !target.class().is_subclass_of(class.name()) {
            return Err(MirrorError::IllegalArgument(format!(
                "{} is not an instance of {}",
                target.class().name(),
                class.name()
            )));
        }
        let handler = MirrorInvocationHandler::new(self.shared()?, Arc::clone(class), target);
        let proxy = self.proxies.create(Arc::clone(contract), Arc::new(handler));
        tracing::trace!(
            target: "mirror::engine",
            "mirror #{} of {} over {}",
            proxy.id(),
            contract.name(),
            class.name()
        );
        Ok(proxy)
    }
}

impl MirrorSpawner for EngineShared {
    fn spawn_mirror(&self, contract: &str, target: ObjectRef) -> MirrorResult<Proxy> {
        let spawn = || -> MirrorResult<Proxy> {
            let mirror = self.metadata.contract(contract)?;
            let class = self.mirror_binding(&mirror)?;
            self.bind(&mirror, &class, target)
        };
        spawn().map_err(|e| MirrorError::creation(contract, e))
    }
}

impl fmt::Debug for EngineShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineShared")
            .field("contracts", &self.metadata.contracts().len())
            .field("classes", &self.metadata.classes().len())
            .field("failures", &self.failures.len())
            .field("config", &self.config)
            .field("bindings", &self.bindings.len())
            .field("cached_members", &self.resolver.cached_len())
            .finish()
    }
}

/// Builder for [`MirrorEngine`]
pub struct MirrorEngineBuilder {
    classes: ClassRegistry,
    contracts: ContractRegistry,
    failures: FailureRegistry,
    config: EngineConfig,
    proxies: Arc<dyn ProxyFactory>,
}

impl MirrorEngineBuilder {
    /// Create a builder with empty registries and default configuration
    pub fn new() -> Self {
        Self {
            classes: ClassRegistry::new(),
            contracts: ContractRegistry::new(),
            failures: FailureRegistry::new(),
            config: EngineConfig::default(),
            proxies: Arc::new(DefaultProxyFactory::new()),
        }
    }

    /// Hidden classes the engine may reach
    pub fn classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    /// Replace the contract registry
    pub fn contracts(mut self, contracts: ContractRegistry) -> Self {
        self.contracts = contracts;
        self
    }

    /// Register one more contract
    pub fn contract(mut self, contract: Contract) -> Self {
        self.contracts.register(contract);
        self
    }

    /// Register every contract declared in a manifest
    pub fn manifest(mut self, manifest: &ContractManifest) -> Result<Self, ManifestError> {
        manifest.register_into(&mut self.contracts)?;
        Ok(self)
    }

    /// Failure taxonomy
    pub fn failures(mut self, failures: FailureRegistry) -> Self {
        self.failures = failures;
        self
    }

    /// Engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Proxy capability used to materialize contract objects
    pub fn proxy_factory(mut self, proxies: impl ProxyFactory + 'static) -> Self {
        self.proxies = Arc::new(proxies);
        self
    }

    /// Build the engine
    pub fn build(self) -> MirrorEngine {
        let metadata = ContractMetadata::new(Arc::new(self.contracts), Arc::new(self.classes));
        let failures = Arc::new(self.failures);
        let policy = self.config.permission_policy();
        let unwrapper = Unwrapper::new(metadata.clone());
        let resolver = MemberResolver::new(unwrapper.clone(), self.config.mirror.cache_members);
        let translator =
            FailureTranslator::new(Arc::clone(&failures), self.config.mirror.undeclared_failures);
        let validator = ContractValidator::new(metadata.clone(), Arc::clone(&failures));

        tracing::debug!(
            target: "mirror::engine",
            "mirror engine ready: {} contracts, {} classes, default permissions {}",
            metadata.contracts().len(),
            metadata.classes().len(),
            self.config.mirror.permissions
        );

        let shared = Arc::new_cyclic(|this| EngineShared {
            this: this.clone(),
            metadata,
            failures,
            config: self.config,
            policy,
            validator,
            unwrapper,
            wrapper: Wrapper::new(),
            resolver,
            translator,
            proxies: self.proxies,
            bindings: DashMap::new(),
        });
        MirrorEngine { shared }
    }
}

impl Default for MirrorEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point for creating mirrors, mirror creators and object factories
///
/// Cheap to clone; clones share registries, configuration and the member
/// cache.
#[derive(Debug, Clone)]
pub struct MirrorEngine {
    shared: Arc<EngineShared>,
}

impl MirrorEngine {
    /// Start building an engine
    pub fn builder() -> MirrorEngineBuilder {
        MirrorEngineBuilder::new()
    }

    /// Validate a mirror contract and resolve its target class.
    ///
    /// The returned [`Mirror`] creates any number of instances without
    /// repeating the checks.
    pub fn mirror(&self, contract: &str) -> MirrorResult<Mirror> {
        let lookup = || -> MirrorResult<_> {
            let mirror = self.shared.metadata.contract(contract)?;
            let class = self.shared.mirror_binding(&mirror)?;
            Ok((mirror, class))
        };
        let (contract, class) = lookup().map_err(|e| MirrorError::creation(contract, e))?;
        Ok(Mirror {
            shared: Arc::clone(&self.shared),
            contract,
            class,
        })
    }

    /// Create a mirror of `contract` bound to `target`
    pub fn create_mirror(&self, contract: &str, target: ObjectRef) -> MirrorResult<Proxy> {
        self.mirror(contract)?.create(target)
    }

    /// Create a mirror creator: each constructor member builds a new hidden
    /// object and returns it wrapped in the mirror contract it declares
    pub fn create_mirror_creator(&self, contract: &str) -> MirrorResult<Proxy> {
        let build = || -> MirrorResult<Proxy> {
            let creator = self.shared.metadata.contract(contract)?;
            self.shared.validator.validate_creator(&creator)?;
            let handler = MirrorCreatorInvocationHandler::new(Arc::clone(&self.shared));
            Ok(self.shared.proxies.create(creator, Arc::new(handler)))
        };
        let proxy = build().map_err(|e| MirrorError::creation(contract, e))?;
        tracing::debug!(target: "mirror::engine", "mirror creator #{} of {}", proxy.id(), contract);
        Ok(proxy)
    }

    /// Create an object factory bound to the mirror contract it names
    pub fn create_object_factory(&self, contract: &str) -> MirrorResult<Proxy> {
        let build = || -> MirrorResult<Proxy> {
            let factory = self.shared.metadata.contract(contract)?;
            self.shared.validator.validate_factory(&factory)?;
            let mirror = self.shared.metadata.factory_mirror_contract(&factory)?;
            let class = self.shared.mirror_binding(&mirror)?;
            let handler =
                ObjectFactoryInvocationHandler::new(Arc::clone(&self.shared), mirror, class);
            Ok(self.shared.proxies.create(factory, Arc::new(handler)))
        };
        let proxy = build().map_err(|e| MirrorError::creation(contract, e))?;
        tracing::debug!(target: "mirror::engine", "object factory #{} of {}", proxy.id(), contract);
        Ok(proxy)
    }

    /// Registered hidden classes
    pub fn classes(&self) -> &ClassRegistry {
        self.shared.classes()
    }

    /// Registered contracts
    pub fn contracts(&self) -> &ContractRegistry {
        self.shared.metadata.contracts()
    }

    /// Failure taxonomy
    pub fn failures(&self) -> &FailureRegistry {
        &self.shared.failures
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Permission the engine holds for a hidden class name
    pub fn permission_for(&self, class_name: &str) -> ReflectionPermission {
        self.shared.policy.resolve(class_name)
    }

    /// Number of memoized member resolutions
    pub fn cached_members(&self) -> usize {
        self.shared.resolver.cached_len()
    }
}

/// A validated mirror contract bound to its target class
#[derive(Debug, Clone)]
pub struct Mirror {
    shared: Arc<EngineShared>,
    contract: Arc<Contract>,
    class: Arc<ClassDescriptor>,
}

impl Mirror {
    /// Create a mirror instance over `target`, which must be an instance of
    /// the target class or one of its subclasses
    pub fn create(&self, target: ObjectRef) -> MirrorResult<Proxy> {
        self.shared
            .bind(&self.contract, &self.class, target)
            .map_err(|e| MirrorError::creation(self.contract.name(), e))
    }

    /// The mirror contract
    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    /// The hidden class the contract targets
    pub fn target_class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }
}
