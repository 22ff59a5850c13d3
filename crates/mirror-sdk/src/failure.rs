//! Failure kinds and failure values
//!
//! Hidden members report failure by returning a [`Failure`]: an instance of a
//! [`FailureClass`] with a message, an optional cause and any number of
//! suppressed failures. Failure classes form a single-inheritance tree and are
//! either *checked* (callers are expected to declare them) or *unchecked*.
//!
//! Whether a failure class can be built as a wrapper for another failure is
//! described by [`FailureConstructors`]: a cause constructor takes the
//! original failure directly, a no-argument constructor needs the cause
//! attached afterwards.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{MirrorError, MirrorResult};

/// Constructor shapes a failure class offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureConstructors {
    /// `new(cause)`
    pub cause: bool,
    /// `new()`
    pub no_arg: bool,
}

impl Default for FailureConstructors {
    fn default() -> Self {
        Self {
            cause: true,
            no_arg: true,
        }
    }
}

/// A kind of failure
#[derive(Debug)]
pub struct FailureClass {
    name: String,
    parent: Option<Arc<FailureClass>>,
    checked: bool,
    constructors: FailureConstructors,
    mirrors: Option<String>,
}

impl FailureClass {
    /// Start building a failure class
    pub fn builder(name: impl Into<String>) -> FailureClassBuilder {
        FailureClassBuilder::new(name)
    }

    /// Failure class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent failure class
    pub fn parent(&self) -> Option<&Arc<FailureClass>> {
        self.parent.as_ref()
    }

    /// Whether callers are expected to declare this failure
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Available constructors
    pub fn constructors(&self) -> FailureConstructors {
        self.constructors
    }

    /// Hidden failure kind this caller-side kind stands for
    pub fn mirrors(&self) -> Option<&str> {
        self.mirrors.as_deref()
    }

    /// Check if this class is `name` or descends from it
    pub fn is_subclass_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == name {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }

    /// Build an instance through the cause constructor
    pub fn construct_with_cause(self: &Arc<Self>, cause: Failure) -> Option<Failure> {
        if !self.constructors.cause {
            return None;
        }
        Some(Failure {
            class: Arc::clone(self),
            message: Some(cause.to_string()),
            cause: Some(Box::new(cause)),
            suppressed: Vec::new(),
        })
    }

    /// Build an instance through the no-argument constructor
    pub fn construct_default(self: &Arc<Self>) -> Option<Failure> {
        self.constructors.no_arg.then(|| Failure::new(self))
    }
}

/// Builder for [`FailureClass`]
#[derive(Debug)]
pub struct FailureClassBuilder {
    name: String,
    parent: Option<Arc<FailureClass>>,
    checked: Option<bool>,
    constructors: FailureConstructors,
    mirrors: Option<String>,
}

impl FailureClassBuilder {
    /// Start a failure class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            checked: None,
            constructors: FailureConstructors::default(),
            mirrors: None,
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &Arc<FailureClass>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Override checked-ness (inherited from the parent otherwise)
    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Whether a cause constructor exists
    pub fn cause_constructor(mut self, available: bool) -> Self {
        self.constructors.cause = available;
        self
    }

    /// Whether a no-argument constructor exists
    pub fn no_arg_constructor(mut self, available: bool) -> Self {
        self.constructors.no_arg = available;
        self
    }

    /// Declare the hidden failure kind this class stands for
    pub fn mirrors(mut self, source: impl Into<String>) -> Self {
        self.mirrors = Some(source.into());
        self
    }

    /// Finish the class
    pub fn build(self) -> Arc<FailureClass> {
        let checked = self
            .checked
            .or_else(|| self.parent.as_ref().map(|p| p.checked))
            .unwrap_or(true);
        Arc::new(FailureClass {
            name: self.name,
            parent: self.parent,
            checked,
            constructors: self.constructors,
            mirrors: self.mirrors,
        })
    }
}

/// A failure value
#[derive(Debug, Clone)]
pub struct Failure {
    class: Arc<FailureClass>,
    message: Option<String>,
    cause: Option<Box<Failure>>,
    suppressed: Vec<Failure>,
}

impl Failure {
    /// Create a failure without a message
    pub fn new(class: &Arc<FailureClass>) -> Self {
        Self {
            class: Arc::clone(class),
            message: None,
            cause: None,
            suppressed: Vec::new(),
        }
    }

    /// Create a failure with a message
    pub fn with_message(class: &Arc<FailureClass>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(class)
        }
    }

    /// Failure class
    pub fn class(&self) -> &Arc<FailureClass> {
        &self.class
    }

    /// Failure class name
    pub fn kind(&self) -> &str {
        self.class.name()
    }

    /// Message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Cause, if any
    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    /// Suppressed failures
    pub fn suppressed(&self) -> &[Failure] {
        &self.suppressed
    }

    /// Attach a cause; false if one is already attached
    pub fn init_cause(&mut self, cause: Failure) -> bool {
        if self.cause.is_some() {
            return false;
        }
        self.cause = Some(Box::new(cause));
        true
    }

    /// Record a failure that was suppressed in favour of this one
    pub fn add_suppressed(&mut self, failure: Failure) {
        self.suppressed.push(failure);
    }

    /// Check if this failure's class is `kind` or descends from it
    pub fn is_instance_of(&self, kind: &str) -> bool {
        self.class.is_subclass_of(kind)
    }

    /// Check if this failure needs no declaration
    pub fn is_unchecked(&self) -> bool {
        !self.class.checked
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.class.name, message),
            None => write!(f, "{}", self.class.name),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// Failure Registry
// ============================================================================

/// Root of every failure
pub const THROWABLE: &str = "Throwable";
/// Root of checked failures
pub const EXCEPTION: &str = "Exception";
/// Root of unchecked failures raised by programs
pub const RUNTIME_EXCEPTION: &str = "RuntimeException";
/// Root of unchecked failures raised by the host
pub const ERROR: &str = "Error";

/// Registry of failure classes by name
#[derive(Debug)]
pub struct FailureRegistry {
    classes: FxHashMap<String, Arc<FailureClass>>,
    throwable: Arc<FailureClass>,
    exception: Arc<FailureClass>,
    runtime_exception: Arc<FailureClass>,
    error: Arc<FailureClass>,
}

impl FailureRegistry {
    /// Create a registry holding the built-in failure hierarchy
    pub fn new() -> Self {
        let throwable = FailureClass::builder(THROWABLE).checked(true).build();
        let exception = FailureClass::builder(EXCEPTION).extends(&throwable).build();
        let runtime_exception = FailureClass::builder(RUNTIME_EXCEPTION)
            .extends(&exception)
            .checked(false)
            .build();
        let error = FailureClass::builder(ERROR)
            .extends(&throwable)
            .checked(false)
            .build();

        let mut registry = Self {
            classes: FxHashMap::default(),
            throwable: Arc::clone(&throwable),
            exception: Arc::clone(&exception),
            runtime_exception: Arc::clone(&runtime_exception),
            error: Arc::clone(&error),
        };
        for class in [throwable, exception, runtime_exception, error] {
            registry.register(class);
        }
        registry
    }

    /// Build and register a failure class
    pub fn define(&mut self, builder: FailureClassBuilder) -> Arc<FailureClass> {
        self.register(builder.build())
    }

    /// Register a built failure class
    pub fn register(&mut self, class: Arc<FailureClass>) -> Arc<FailureClass> {
        self.classes.insert(class.name.clone(), Arc::clone(&class));
        class
    }

    /// Get a failure class by name
    pub fn get(&self, name: &str) -> Option<&Arc<FailureClass>> {
        self.classes.get(name)
    }

    /// Get a failure class by name, failing with `ClassNotFound`
    pub fn load(&self, name: &str) -> MirrorResult<Arc<FailureClass>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| MirrorError::ClassNotFound(format!("failure kind {}", name)))
    }

    /// Check if a failure class is registered
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Get number of registered failure classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `Throwable`
    pub fn throwable(&self) -> &Arc<FailureClass> {
        &self.throwable
    }

    /// `Exception`
    pub fn exception(&self) -> &Arc<FailureClass> {
        &self.exception
    }

    /// `RuntimeException`
    pub fn runtime_exception(&self) -> &Arc<FailureClass> {
        &self.runtime_exception
    }

    /// `Error`
    pub fn error(&self) -> &Arc<FailureClass> {
        &self.error
    }
}

impl Default for FailureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
