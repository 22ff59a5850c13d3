//! Runtime values
//!
//! `Value` is what flows through a mirrored call: arguments, return values and
//! field contents. Primitives and strings are stored inline, arrays are shared
//! immutable sequences tagged with their element type, and objects/proxies are
//! reference-counted handles compared by identity.

use std::fmt;
use std::sync::Arc;

use crate::object::ObjectRef;
use crate::proxy::Proxy;
use crate::types::{PrimitiveType, TypeRef};

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// The null reference (also the result of `void` calls)
    #[default]
    Null,
    /// `boolean`
    Bool(bool),
    /// `int`
    I32(i32),
    /// `long`
    I64(i64),
    /// `double`
    F64(f64),
    /// `char`
    Char(char),
    /// Built-in string
    Str(Arc<str>),
    /// Array with element type
    Array(Arc<ArrayValue>),
    /// Instance of a host class
    Object(ObjectRef),
    /// Runtime-generated contract implementation
    Proxy(Proxy),
}

/// Array contents together with the declared element type
#[derive(Debug, Clone)]
pub struct ArrayValue {
    element_type: TypeRef,
    elements: Vec<Value>,
}

impl ArrayValue {
    /// Create an array of the given element type
    pub fn new(element_type: TypeRef, elements: Vec<Value>) -> Self {
        Self {
            element_type,
            elements,
        }
    }

    /// Declared element type
    pub fn element_type(&self) -> &TypeRef {
        &self.element_type
    }

    /// Array elements
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the array has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    /// The array type (`T[]`) of this value
    pub fn array_type(&self) -> TypeRef {
        TypeRef::array_of(self.element_type.clone())
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type && self.elements == other.elements
    }
}

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Create an array value
    pub fn array(element_type: TypeRef, elements: Vec<Value>) -> Self {
        Value::Array(Arc::new(ArrayValue::new(element_type, elements)))
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as char
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&Arc<ArrayValue>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Get as host object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Get as proxy
    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// Primitive kind, if this is a primitive
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Bool(_) => Some(PrimitiveType::Bool),
            Value::I32(_) => Some(PrimitiveType::I32),
            Value::I64(_) => Some(PrimitiveType::I64),
            Value::F64(_) => Some(PrimitiveType::F64),
            Value::Char(_) => Some(PrimitiveType::Char),
            _ => None,
        }
    }

    /// Short description of the runtime type, for diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::Array(array) => array.array_type().to_string(),
            Value::Object(object) => object.class().name().to_string(),
            Value::Proxy(proxy) => format!("@{}", proxy.contract().name()),
            other => other
                .primitive_type()
                .map(|p| p.name().to_string())
                .unwrap_or_default(),
        }
    }

    /// Check whether this value may be passed where `ty` is declared.
    ///
    /// Exact kinds only: no numeric widening and no boxing.
    pub fn conforms_to(&self, ty: &TypeRef) -> bool {
        match (self, ty) {
            (_, TypeRef::Void) => false,
            (Value::Null, ty) => ty.is_reference(),
            (value, TypeRef::Primitive(expected)) => value.primitive_type() == Some(*expected),
            (Value::Str(_), TypeRef::Str) => true,
            (Value::Array(array), TypeRef::Array(component)) => {
                array.element_type() == component.as_ref()
            }
            (Value::Object(object), TypeRef::Class(name)) => object.class().is_subclass_of(name),
            (Value::Proxy(proxy), TypeRef::Contract(name)) => proxy.contract().name() == name,
            (value, TypeRef::Any) => value.primitive_type().is_none(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Proxy(a), Value::Proxy(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::I32(i) => write!(f, "I32({})", i),
            Value::I64(i) => write!(f, "I64({})", i),
            Value::F64(x) => write!(f, "F64({})", x),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(array) => f
                .debug_struct("Array")
                .field("element_type", array.element_type())
                .field("elements", &array.elements())
                .finish(),
            Value::Object(object) => {
                write!(f, "Object({}@{:p})", object.class().name(), Arc::as_ptr(object))
            }
            Value::Proxy(proxy) => write!(f, "Proxy(@{}#{})", proxy.contract().name(), proxy.id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<Proxy> for Value {
    fn from(proxy: Proxy) -> Self {
        Value::Proxy(proxy)
    }
}
