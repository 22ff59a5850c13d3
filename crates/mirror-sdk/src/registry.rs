//! Class registry
//!
//! Maps fully qualified class names to their descriptors. This is where the
//! mirror engine resolves a contract's target type name to an actual class.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::class::{ClassBuilder, ClassDescriptor};
use crate::error::{MirrorError, MirrorResult};
use crate::object::ObjectRef;
use crate::permissions::ReflectionPermission;
use crate::value::Value;

/// Registry of host classes by name
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built class, replacing any class of the same name
    pub fn register(&mut self, class: Arc<ClassDescriptor>) -> Arc<ClassDescriptor> {
        self.classes
            .insert(class.name().to_string(), Arc::clone(&class));
        class
    }

    /// Build and register a class
    pub fn define(&mut self, builder: ClassBuilder) -> Arc<ClassDescriptor> {
        self.register(builder.build())
    }

    /// Get a class by name
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Get a class by name, failing with `ClassNotFound`
    pub fn load(&self, name: &str) -> MirrorResult<Arc<ClassDescriptor>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| MirrorError::ClassNotFound(name.to_string()))
    }

    /// Check if a class is registered
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterate over registered class names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Get number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Construct an instance of `name` with the first constructor whose
    /// parameters accept `args`.
    ///
    /// Intended for host code building its own objects, so no visibility
    /// restriction applies.
    pub fn instantiate(&self, name: &str, args: &[Value]) -> MirrorResult<ObjectRef> {
        let class = self.load(name)?;
        let index = class
            .declared_constructors()
            .iter()
            .position(|c| {
                c.params().len() == args.len()
                    && c.params().iter().zip(args).all(|(p, a)| a.conforms_to(p))
            })
            .ok_or_else(|| {
                MirrorError::NoSuchMember(format!(
                    "{} has no constructor accepting {} argument(s)",
                    name,
                    args.len()
                ))
            })?;
        let constructor = class
            .constructor_ref(index)
            .ok_or_else(|| MirrorError::NoSuchMember(format!("{}.<init>", name)))?;
        constructor.new_instance(self, ReflectionPermission::FULL_ACCESS, args)
    }
}
