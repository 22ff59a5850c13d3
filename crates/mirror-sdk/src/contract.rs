//! Contract declarations
//!
//! A contract is the caller's description of a hidden class: which methods it
//! wants to call, which fields it wants to read or write and which
//! constructors it wants to use. Contracts are plain data, declared in code or
//! loaded from a manifest, and registered in a [`ContractRegistry`].
//!
//! # Example
//!
//! ```ignore
//! let point = Contract::mirror("Point", "com.acme.geom.Point")
//!     .method(ContractMethod::new("x").returns(TypeRef::I32).get_field("x"))
//!     .method(ContractMethod::new("x").param(TypeRef::I32).set_field("x"))
//!     .method(ContractMethod::new("length").returns(TypeRef::F64));
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{MirrorError, MirrorResult};
use crate::types::{signature_string, TypeRef};
use crate::value::Value;

/// What a contract declares itself to be
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContractMarker {
    /// No marker; such a contract cannot be used to build a mirror
    #[default]
    Unmarked,
    /// Mirrors the named hidden class
    Mirror {
        /// Fully qualified name of the hidden class
        target: String,
    },
    /// Constructs hidden objects; each constructor method names its result
    /// contract through its return type
    Creator,
    /// Constructs hidden objects of one fixed mirror contract
    Factory {
        /// Name of the mirror contract every method returns
        mirror: String,
    },
}

impl ContractMarker {
    /// Short name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ContractMarker::Unmarked => "unmarked",
            ContractMarker::Mirror { .. } => "mirror",
            ContractMarker::Creator => "mirror creator",
            ContractMarker::Factory { .. } => "object factory",
        }
    }
}

/// Role of a contract method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MemberRole {
    /// Call the hidden method of the same name and parameter types
    #[default]
    Method,
    /// Read the named hidden field
    GetField(String),
    /// Write the named hidden field
    SetField(String),
    /// Call the hidden constructor with the same parameter types
    Constructor,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRole::Method => write!(f, "method"),
            MemberRole::GetField(field) => write!(f, "getter of `{}`", field),
            MemberRole::SetField(field) => write!(f, "setter of `{}`", field),
            MemberRole::Constructor => write!(f, "constructor"),
        }
    }
}

/// Failure conversion declared on a contract method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapRule {
    /// Failure kind raised by the hidden member
    pub from: String,
    /// Failure kind the caller receives instead
    pub to: String,
}

impl WrapRule {
    /// Create a rule
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A method declared on a contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractMethod {
    name: String,
    params: Vec<TypeRef>,
    return_type: TypeRef,
    roles: Vec<MemberRole>,
    throws: Vec<String>,
    wraps: Vec<WrapRule>,
    index: usize,
}

impl ContractMethod {
    /// Declare a method taking nothing and returning nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::Void,
            roles: Vec::new(),
            throws: Vec::new(),
            wraps: Vec::new(),
            index: 0,
        }
    }

    /// Append a parameter
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Replace the parameter list
    pub fn params(mut self, params: Vec<TypeRef>) -> Self {
        self.params = params;
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    /// Mark as a getter of the named field
    pub fn get_field(mut self, field: impl Into<String>) -> Self {
        self.roles.push(MemberRole::GetField(field.into()));
        self
    }

    /// Mark as a setter of the named field
    pub fn set_field(mut self, field: impl Into<String>) -> Self {
        self.roles.push(MemberRole::SetField(field.into()));
        self
    }

    /// Mark as a constructor
    pub fn constructor(mut self) -> Self {
        self.roles.push(MemberRole::Constructor);
        self
    }

    /// Declare a failure kind callers handle
    pub fn throws(mut self, kind: impl Into<String>) -> Self {
        self.throws.push(kind.into());
        self
    }

    /// Append a wrap rule; rules are tried in the order they are added
    pub fn wrap(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.wraps.push(WrapRule::new(from, to));
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types
    pub fn param_types(&self) -> &[TypeRef] {
        &self.params
    }

    /// Declared return type
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// The method's role (plain method when unmarked)
    pub fn role(&self) -> MemberRole {
        self.roles.first().cloned().unwrap_or_default()
    }

    /// Every role marker attached, in order
    pub fn role_markers(&self) -> &[MemberRole] {
        &self.roles
    }

    /// More than one role marker was attached
    pub fn is_ambiguous(&self) -> bool {
        self.roles.len() > 1
    }

    /// Declared failure kinds
    pub fn declared_failures(&self) -> &[String] {
        &self.throws
    }

    /// Wrap rules in declaration order
    pub fn wrap_rules(&self) -> &[WrapRule] {
        &self.wraps
    }

    /// Position within the owning contract
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check whether `args` fit the declared parameters
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| a.conforms_to(p))
    }

    /// `name(int, @Point)`
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, signature_string(&self.params))
    }
}

/// A caller-declared contract
#[derive(Debug, Clone)]
pub struct Contract {
    name: String,
    marker: ContractMarker,
    methods: Vec<ContractMethod>,
}

impl Contract {
    /// Declare a contract with an explicit marker
    pub fn new(name: impl Into<String>, marker: ContractMarker) -> Self {
        Self {
            name: name.into(),
            marker,
            methods: Vec::new(),
        }
    }

    /// Declare a contract mirroring `target`
    pub fn mirror(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            ContractMarker::Mirror {
                target: target.into(),
            },
        )
    }

    /// Declare a mirror-creator contract
    pub fn creator(name: impl Into<String>) -> Self {
        Self::new(name, ContractMarker::Creator)
    }

    /// Declare an object-factory contract producing `mirror` instances
    pub fn factory(name: impl Into<String>, mirror: impl Into<String>) -> Self {
        Self::new(
            name,
            ContractMarker::Factory {
                mirror: mirror.into(),
            },
        )
    }

    /// Declare a contract without a marker
    pub fn unmarked(name: impl Into<String>) -> Self {
        Self::new(name, ContractMarker::Unmarked)
    }

    /// Append a method
    pub fn method(mut self, mut method: ContractMethod) -> Self {
        method.index = self.methods.len();
        self.methods.push(method);
        self
    }

    /// Contract name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marker
    pub fn marker(&self) -> &ContractMarker {
        &self.marker
    }

    /// Declared methods
    pub fn methods(&self) -> &[ContractMethod] {
        &self.methods
    }

    /// Method at position
    pub fn method_at(&self, index: usize) -> Option<&ContractMethod> {
        self.methods.get(index)
    }

    /// Check that `method` is the one declared at its own position
    pub fn declares(&self, method: &ContractMethod) -> bool {
        self.method_at(method.index) == Some(method)
    }

    /// Methods with the given name
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ContractMethod> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Pick the declared method a call with `args` refers to: the first
    /// method with this name whose parameters accept the arguments.
    pub fn select_method(&self, name: &str, args: &[Value]) -> MirrorResult<&ContractMethod> {
        let mut named = self.methods.iter().filter(|m| m.name == name).peekable();
        if named.peek().is_none() {
            return Err(MirrorError::NoSuchMember(format!(
                "contract {} declares no method `{}`",
                self.name, name
            )));
        }
        named.find(|m| m.accepts(args)).ok_or_else(|| {
            let given: Vec<String> = args.iter().map(Value::type_name).collect();
            MirrorError::IllegalArgument(format!(
                "no overload of {}.{} accepts ({})",
                self.name,
                name,
                given.join(", ")
            ))
        })
    }
}

/// Registry of contracts by name
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: FxHashMap<String, Arc<Contract>>,
}

impl ContractRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract, replacing any contract of the same name
    pub fn register(&mut self, contract: Contract) -> Arc<Contract> {
        let contract = Arc::new(contract);
        self.contracts
            .insert(contract.name.clone(), Arc::clone(&contract));
        contract
    }

    /// Get a contract by name
    pub fn get(&self, name: &str) -> Option<&Arc<Contract>> {
        self.contracts.get(name)
    }

    /// Check if a contract is registered
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Iterate over registered contracts
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Contract>> {
        self.contracts.values()
    }

    /// Get number of registered contracts
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
