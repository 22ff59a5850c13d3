//! Class descriptors
//!
//! A `ClassDescriptor` is the host's description of a class: its name,
//! superclass, declared fields, methods and constructors. Member bodies are
//! host closures; reflective callers reach them through [`MethodRef`],
//! [`FieldRef`] and [`ConstructorRef`], which check the caller's
//! [`ReflectionPermission`] on every operation.
//!
//! ## Slot layout
//!
//! Instance fields are laid out superclass-first: a subclass's first declared
//! instance field takes the slot after the last slot of its superclass. Static
//! fields are stored on the declaring class itself.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{MirrorError, MirrorResult};
use crate::failure::Failure;
use crate::object::{Object, ObjectRef};
use crate::permissions::{MemberAccess, ReflectionPermission};
use crate::registry::ClassRegistry;
use crate::types::{signature_string, TypeRef};
use crate::value::Value;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to subclasses
    Protected,
    /// Visible within the declaring package
    Package,
    /// Visible only inside the declaring class
    Private,
}

impl Visibility {
    /// Check if this is public visibility
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package-private",
            Visibility::Private => "private",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Call Frame
// ============================================================================

static NULL: Value = Value::Null;

/// What a member body sees when it runs
pub struct CallFrame<'a> {
    this: Option<&'a ObjectRef>,
    args: &'a [Value],
    classes: &'a ClassRegistry,
}

impl<'a> CallFrame<'a> {
    /// Create a frame
    pub fn new(this: Option<&'a ObjectRef>, args: &'a [Value], classes: &'a ClassRegistry) -> Self {
        Self {
            this,
            args,
            classes,
        }
    }

    /// Receiver (None for static members)
    pub fn this(&self) -> Option<&'a ObjectRef> {
        self.this
    }

    /// All arguments
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Argument at index, or null when out of range
    pub fn arg(&self, index: usize) -> &'a Value {
        self.args.get(index).unwrap_or(&NULL)
    }

    /// Registry for creating other host objects
    pub fn classes(&self) -> &'a ClassRegistry {
        self.classes
    }
}

/// Method body
pub type MethodBody = Arc<dyn Fn(&CallFrame<'_>) -> Result<Value, Failure> + Send + Sync>;

/// Constructor body; runs against a freshly allocated receiver
pub type ConstructorBody = Arc<dyn Fn(&CallFrame<'_>) -> Result<(), Failure> + Send + Sync>;

// ============================================================================
// Member Descriptors
// ============================================================================

/// Field declaration
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeRef,
    visibility: Visibility,
    is_static: bool,
    initial: Option<Value>,
    slot: usize,
    declaring_class: String,
}

impl FieldDescriptor {
    /// Declare a public instance field
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            initial: None,
            slot: 0,
            declaring_class: String::new(),
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Make private
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Make protected
    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    /// Make static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Initial value (defaults to the type's zero value)
    pub fn with_initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Slot index (instance slot or static slot)
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Name of the declaring class
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    fn initial_value(&self) -> Value {
        self.initial.clone().unwrap_or_else(|| self.ty.default_value())
    }
}

/// Method declaration
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<TypeRef>,
    return_type: TypeRef,
    visibility: Visibility,
    is_static: bool,
    declaring_class: String,
    body: MethodBody,
}

impl MethodDescriptor {
    /// Declare a public instance method
    pub fn new(
        name: impl Into<String>,
        params: Vec<TypeRef>,
        return_type: TypeRef,
        body: impl Fn(&CallFrame<'_>) -> Result<Value, Failure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            visibility: Visibility::Public,
            is_static: false,
            declaring_class: String::new(),
            body: Arc::new(body),
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Make private
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Make protected
    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    /// Make static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Return type
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Name of the declaring class
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    /// `name(int, String)`
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, signature_string(&self.params))
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("signature", &self.signature())
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Constructor declaration
#[derive(Clone)]
pub struct ConstructorDescriptor {
    params: Vec<TypeRef>,
    visibility: Visibility,
    declaring_class: String,
    body: ConstructorBody,
}

impl ConstructorDescriptor {
    /// Declare a public constructor
    pub fn new(
        params: Vec<TypeRef>,
        body: impl Fn(&CallFrame<'_>) -> Result<(), Failure> + Send + Sync + 'static,
    ) -> Self {
        Self {
            params,
            visibility: Visibility::Public,
            declaring_class: String::new(),
            body: Arc::new(body),
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Make private
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Parameter types
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Name of the declaring class
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    /// `<init>(int, String)`
    pub fn signature(&self) -> String {
        format!("<init>{}", signature_string(&self.params))
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("signature", &self.signature())
            .field("visibility", &self.visibility)
            .finish()
    }
}

// ============================================================================
// Class Descriptor
// ============================================================================

/// Description of a host class
pub struct ClassDescriptor {
    name: String,
    superclass: Option<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    /// Declared field name to index in `fields`
    field_indices: FxHashMap<String, usize>,
    /// Initial instance slots, inherited slots first
    slot_defaults: Vec<Value>,
    statics: RwLock<Vec<Value>>,
}

impl ClassDescriptor {
    /// Start building a class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct superclass
    pub fn superclass(&self) -> Option<&Arc<ClassDescriptor>> {
        self.superclass.as_ref()
    }

    /// Declared fields (not inherited)
    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Declared methods (not inherited)
    pub fn declared_methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Declared constructors
    pub fn declared_constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// This class followed by its superclasses, nearest first
    pub fn lineage(self: &Arc<Self>) -> impl Iterator<Item = Arc<ClassDescriptor>> {
        std::iter::successors(Some(Arc::clone(self)), |class| class.superclass.clone())
    }

    /// Check if this class is `name` or inherits from it
    pub fn is_subclass_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == name {
                return true;
            }
            current = class.superclass.as_deref();
        }
        false
    }

    /// Index of the declared field with this name
    pub fn declared_field_index(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// Index of the declared method with this exact name and parameter list
    pub fn declared_method_index(&self, name: &str, params: &[TypeRef]) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| m.name == name && m.params.as_slice() == params)
    }

    /// Index of the declared constructor with this exact parameter list
    pub fn declared_constructor_index(&self, params: &[TypeRef]) -> Option<usize> {
        self.constructors
            .iter()
            .position(|c| c.params.as_slice() == params)
    }

    /// Instance slot for a field name, searching the most derived class first
    pub fn instance_slot(&self, name: &str) -> Option<usize> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(field) = class.declared_field_index(name).map(|i| &class.fields[i]) {
                if !field.is_static {
                    return Some(field.slot);
                }
            }
            current = class.superclass.as_deref();
        }
        None
    }

    /// Number of instance slots, inherited ones included
    pub fn slot_count(&self) -> usize {
        self.slot_defaults.len()
    }

    /// Allocate an instance with every slot at its initial value
    pub fn allocate(self: &Arc<Self>) -> ObjectRef {
        Object::new(Arc::clone(self), self.slot_defaults.clone())
    }

    /// Handle to a declared method
    pub fn method_ref(self: &Arc<Self>, index: usize) -> Option<MethodRef> {
        (index < self.methods.len()).then(|| MethodRef {
            owner: Arc::clone(self),
            index,
        })
    }

    /// Handle to a declared field
    pub fn field_ref(self: &Arc<Self>, index: usize) -> Option<FieldRef> {
        (index < self.fields.len()).then(|| FieldRef {
            owner: Arc::clone(self),
            index,
        })
    }

    /// Handle to a declared constructor
    pub fn constructor_ref(self: &Arc<Self>, index: usize) -> Option<ConstructorRef> {
        (index < self.constructors.len()).then(|| ConstructorRef {
            owner: Arc::clone(self),
            index,
        })
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Builder for [`ClassDescriptor`]
pub struct ClassBuilder {
    name: String,
    superclass: Option<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    methods: Vec<MethodDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
}

impl ClassBuilder {
    /// Start a class with the given fully qualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: &Arc<ClassDescriptor>) -> Self {
        self.superclass = Some(Arc::clone(superclass));
        self
    }

    /// Declare a field
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a constructor
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Finish the class, assigning field slots
    pub fn build(self) -> Arc<ClassDescriptor> {
        let mut slot_defaults = self
            .superclass
            .as_ref()
            .map(|s| s.slot_defaults.clone())
            .unwrap_or_default();
        let mut statics = Vec::new();
        let mut field_indices = FxHashMap::default();

        let mut fields = self.fields;
        for (index, field) in fields.iter_mut().enumerate() {
            field.declaring_class = self.name.clone();
            if field.is_static {
                field.slot = statics.len();
                statics.push(field.initial_value());
            } else {
                field.slot = slot_defaults.len();
                slot_defaults.push(field.initial_value());
            }
            field_indices.insert(field.name.clone(), index);
        }

        let mut methods = self.methods;
        for method in &mut methods {
            method.declaring_class = self.name.clone();
        }

        let mut constructors = self.constructors;
        for constructor in &mut constructors {
            constructor.declaring_class = self.name.clone();
        }

        Arc::new(ClassDescriptor {
            name: self.name,
            superclass: self.superclass,
            fields,
            methods,
            constructors,
            field_indices,
            slot_defaults,
            statics: RwLock::new(statics),
        })
    }
}

// ============================================================================
// Reflective Member Handles
// ============================================================================

fn check_arguments(member: &str, params: &[TypeRef], args: &[Value]) -> MirrorResult<()> {
    if params.len() != args.len() {
        return Err(MirrorError::IllegalArgument(format!(
            "`{}` expects {} argument(s), got {}",
            member,
            params.len(),
            args.len()
        )));
    }
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if !arg.conforms_to(param) {
            return Err(MirrorError::IllegalArgument(format!(
                "argument {} of `{}`: expected {}, got {}",
                index,
                member,
                param,
                arg.type_name()
            )));
        }
    }
    Ok(())
}

fn check_receiver<'a>(
    owner: &ClassDescriptor,
    member: &str,
    receiver: Option<&'a ObjectRef>,
) -> MirrorResult<&'a ObjectRef> {
    let receiver = receiver.ok_or_else(|| {
        MirrorError::IllegalArgument(format!("instance member `{}` needs a receiver", member))
    })?;
    if !receiver.class().is_subclass_of(owner.name()) {
        return Err(MirrorError::IllegalArgument(format!(
            "receiver of type {} is not an instance of {}",
            receiver.class().name(),
            owner.name()
        )));
    }
    Ok(receiver)
}

/// Reflective handle to a method of a specific class
#[derive(Debug, Clone)]
pub struct MethodRef {
    owner: Arc<ClassDescriptor>,
    index: usize,
}

impl MethodRef {
    /// The method declaration
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.owner.methods[self.index]
    }

    /// Declaring class
    pub fn owner(&self) -> &Arc<ClassDescriptor> {
        &self.owner
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.descriptor().is_static
    }

    /// Call the method.
    ///
    /// `receiver` is ignored for static methods. A failure raised by the body
    /// comes back as [`MirrorError::Thrown`].
    pub fn invoke(
        &self,
        classes: &ClassRegistry,
        permission: ReflectionPermission,
        receiver: Option<&ObjectRef>,
        args: &[Value],
    ) -> MirrorResult<Value> {
        let method = self.descriptor();
        let signature = method.signature();
        permission.check(MemberAccess::Invoke, method.visibility, &signature)?;
        check_arguments(&signature, &method.params, args)?;

        let this = if method.is_static {
            None
        } else {
            Some(check_receiver(&self.owner, &signature, receiver)?)
        };

        let frame = CallFrame::new(this, args, classes);
        (method.body)(&frame).map_err(MirrorError::Thrown)
    }
}

/// Reflective handle to a field of a specific class
#[derive(Debug, Clone)]
pub struct FieldRef {
    owner: Arc<ClassDescriptor>,
    index: usize,
}

impl FieldRef {
    /// The field declaration
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.owner.fields[self.index]
    }

    /// Declaring class
    pub fn owner(&self) -> &Arc<ClassDescriptor> {
        &self.owner
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.descriptor().is_static
    }

    /// Read the field
    pub fn get(
        &self,
        permission: ReflectionPermission,
        receiver: Option<&ObjectRef>,
    ) -> MirrorResult<Value> {
        let field = self.descriptor();
        permission.check(MemberAccess::Read, field.visibility, &field.name)?;

        if field.is_static {
            return Ok(self.owner.statics.read()[field.slot].clone());
        }
        let receiver = check_receiver(&self.owner, &field.name, receiver)?;
        receiver.slot(field.slot).ok_or_else(|| {
            MirrorError::IllegalArgument(format!("receiver has no slot for `{}`", field.name))
        })
    }

    /// Write the field
    pub fn set(
        &self,
        permission: ReflectionPermission,
        receiver: Option<&ObjectRef>,
        value: Value,
    ) -> MirrorResult<()> {
        let field = self.descriptor();
        permission.check(MemberAccess::Write, field.visibility, &field.name)?;
        if !value.conforms_to(&field.ty) {
            return Err(MirrorError::IllegalArgument(format!(
                "cannot store {} in field `{}` of type {}",
                value.type_name(),
                field.name,
                field.ty
            )));
        }

        if field.is_static {
            self.owner.statics.write()[field.slot] = value;
            return Ok(());
        }
        let receiver = check_receiver(&self.owner, &field.name, receiver)?;
        if receiver.set_slot(field.slot, value) {
            Ok(())
        } else {
            Err(MirrorError::IllegalArgument(format!(
                "receiver has no slot for `{}`",
                field.name
            )))
        }
    }
}

/// Reflective handle to a constructor of a specific class
#[derive(Debug, Clone)]
pub struct ConstructorRef {
    owner: Arc<ClassDescriptor>,
    index: usize,
}

impl ConstructorRef {
    /// The constructor declaration
    pub fn descriptor(&self) -> &ConstructorDescriptor {
        &self.owner.constructors[self.index]
    }

    /// Class being constructed
    pub fn owner(&self) -> &Arc<ClassDescriptor> {
        &self.owner
    }

    /// Allocate and initialize a new instance
    pub fn new_instance(
        &self,
        classes: &ClassRegistry,
        permission: ReflectionPermission,
        args: &[Value],
    ) -> MirrorResult<ObjectRef> {
        let constructor = self.descriptor();
        let signature = format!("{}.{}", self.owner.name, constructor.signature());
        permission.check(MemberAccess::Invoke, constructor.visibility, &signature)?;
        check_arguments(&signature, &constructor.params, args)?;

        let instance = self.owner.allocate();
        let frame = CallFrame::new(Some(&instance), args, classes);
        (constructor.body)(&frame).map_err(MirrorError::Thrown)?;
        Ok(instance)
    }
}
