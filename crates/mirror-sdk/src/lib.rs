//! Mirror SDK - host object model and contract declarations
//!
//! This crate provides the types shared between code that owns hidden classes
//! and code that wants to reach them through mirrors, without depending on the
//! full mirror-engine:
//!
//! - [`Value`], [`TypeRef`]: what flows through a call and how it is declared
//! - [`ClassDescriptor`], [`ClassRegistry`]: host classes and their members,
//!   reachable reflectively through [`MethodRef`], [`FieldRef`] and
//!   [`ConstructorRef`] under a [`ReflectionPermission`]
//! - [`FailureClass`], [`Failure`], [`FailureRegistry`]: the failure taxonomy
//! - [`Contract`], [`ContractRegistry`]: caller-declared mirror contracts
//! - [`Proxy`], [`InvocationHandler`], [`ProxyFactory`]: the proxy capability
//!
//! # Example
//!
//! ```ignore
//! use mirror_sdk::{ClassBuilder, ClassRegistry, FieldDescriptor, TypeRef};
//!
//! let mut classes = ClassRegistry::new();
//! classes.define(
//!     ClassBuilder::new("com.acme.Vault")
//!         .field(FieldDescriptor::new("secret", TypeRef::I32).private().with_initial(42)),
//! );
//! ```

#![warn(missing_docs)]

pub mod class;
pub mod contract;
pub mod error;
pub mod failure;
pub mod object;
pub mod permissions;
pub mod proxy;
pub mod registry;
pub mod types;
pub mod value;

pub use class::{
    CallFrame, ClassBuilder, ClassDescriptor, ConstructorBody, ConstructorDescriptor,
    ConstructorRef, FieldDescriptor, FieldRef, MethodBody, MethodDescriptor, MethodRef,
    Visibility,
};
pub use contract::{
    Contract, ContractMarker, ContractMethod, ContractRegistry, MemberRole, WrapRule,
};
pub use error::{MirrorError, MirrorResult};
pub use failure::{Failure, FailureClass, FailureClassBuilder, FailureConstructors, FailureRegistry};
pub use object::{Object, ObjectRef};
pub use permissions::{ClassPermissionRule, MemberAccess, PermissionPolicy, ReflectionPermission};
pub use proxy::{DefaultProxyFactory, InvocationHandler, Proxy, ProxyFactory};
pub use registry::ClassRegistry;
pub use types::{PrimitiveType, TypeRef};
pub use value::{ArrayValue, Value};
