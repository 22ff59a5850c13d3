//! Mirror Engine
//!
//! Reaches hidden members of host classes through caller-declared contracts.
//! A contract names the class it mirrors and lists the methods, fields and
//! constructors the caller wants; the engine hands back a proxy whose calls
//! are redirected to the real members, including private ones, with
//! mirrors converted to raw objects on the way in and back on the way out.
//!
//! This crate provides:
//! - Contract metadata lookup and eager validation
//! - Value and type marshalling across the contract graph
//! - Member resolution with overload matching and optional memoization
//! - Dispatch handlers for mirrors, mirror creators and object factories
//! - Failure translation through declared wrap rules
//! - TOML configuration (mirror.toml) and contract manifests
//!
//! # Example
//!
//! ```ignore
//! use mirror_engine::{MirrorEngine, Contract, ContractMethod, TypeRef};
//!
//! let engine = MirrorEngine::builder()
//!     .classes(classes)
//!     .contract(
//!         Contract::mirror("Vault", "com.acme.Vault")
//!             .method(ContractMethod::new("secret").returns(TypeRef::I32).get_field("secret")),
//!     )
//!     .build();
//!
//! let vault = engine.create_mirror("Vault", raw_vault)?;
//! let secret = vault.call("secret", &[])?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod failure;
pub mod manifest;
pub mod marshal;
pub mod metadata;
pub mod resolve;
pub mod validation;

pub use config::{ConfigError, EngineConfig, MirrorSettings, UndeclaredFailurePolicy};
pub use dispatch::{
    MirrorCreatorInvocationHandler, MirrorInvocationHandler, ObjectFactoryInvocationHandler,
};
pub use engine::{Mirror, MirrorEngine, MirrorEngineBuilder};
pub use failure::FailureTranslator;
pub use manifest::{ContractEntry, ContractManifest, ManifestError, MethodEntry, WrapEntry};
pub use marshal::{MirrorSpawner, Unwrapper, Wrapper};
pub use metadata::ContractMetadata;
pub use resolve::{MemberResolver, ResolvedMember};
pub use validation::ContractValidator;

pub use mirror_sdk::{
    ClassBuilder, ClassDescriptor, ClassRegistry, ConstructorDescriptor, Contract, ContractMarker,
    ContractMethod, ContractRegistry, Failure, FailureClass, FailureRegistry, FieldDescriptor,
    MethodDescriptor, MirrorError, MirrorResult, ObjectRef, Proxy, ProxyFactory,
    ReflectionPermission, TypeRef, Value,
};
