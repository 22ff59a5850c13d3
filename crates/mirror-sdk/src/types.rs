//! Type references
//!
//! A `TypeRef` names the declared type of a parameter, return value or field,
//! on either side of a mirror: contract declarations may refer to other
//! contracts (`@Name`), while hidden classes only ever refer to primitives,
//! strings, classes and arrays of those.
//!
//! ## Textual form
//!
//! | Text              | TypeRef                          |
//! |-------------------|----------------------------------|
//! | `void`            | `Void`                           |
//! | `boolean`, `bool` | `Primitive(Bool)`                |
//! | `int`, `i32`      | `Primitive(I32)`                 |
//! | `long`, `i64`     | `Primitive(I64)`                 |
//! | `double`, `f64`   | `Primitive(F64)`                 |
//! | `char`            | `Primitive(Char)`                |
//! | `String`          | `Str`                            |
//! | `Object`, `any`   | `Any`                            |
//! | `@Point`          | `Contract("Point")`              |
//! | `com.acme.Point`  | `Class("com.acme.Point")`        |
//! | `T[]`             | `Array(T)` (one per `[]` suffix) |

use std::fmt;

use crate::value::Value;

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `boolean`
    Bool,
    /// 32-bit `int`
    I32,
    /// 64-bit `long`
    I64,
    /// 64-bit `double`
    F64,
    /// `char`
    Char,
}

impl PrimitiveType {
    /// Canonical source name
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "boolean",
            PrimitiveType::I32 => "int",
            PrimitiveType::I64 => "long",
            PrimitiveType::F64 => "double",
            PrimitiveType::Char => "char",
        }
    }

    /// Zero value used for freshly allocated slots
    pub fn default_value(&self) -> Value {
        match self {
            PrimitiveType::Bool => Value::Bool(false),
            PrimitiveType::I32 => Value::I32(0),
            PrimitiveType::I64 => Value::I64(0),
            PrimitiveType::F64 => Value::F64(0.0),
            PrimitiveType::Char => Value::Char('\0'),
        }
    }
}

/// Declared type of a parameter, return value or field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value (method returns nothing)
    Void,
    /// Primitive value type
    Primitive(PrimitiveType),
    /// Built-in string type
    Str,
    /// Top reference type; accepts any reference value
    Any,
    /// Hidden (or otherwise host-registered) class, by name
    Class(String),
    /// Mirror contract, by name
    Contract(String),
    /// Array of the given component type
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// `boolean`
    pub const BOOL: TypeRef = TypeRef::Primitive(PrimitiveType::Bool);
    /// `int`
    pub const I32: TypeRef = TypeRef::Primitive(PrimitiveType::I32);
    /// `long`
    pub const I64: TypeRef = TypeRef::Primitive(PrimitiveType::I64);
    /// `double`
    pub const F64: TypeRef = TypeRef::Primitive(PrimitiveType::F64);
    /// `char`
    pub const CHAR: TypeRef = TypeRef::Primitive(PrimitiveType::Char);

    /// Class type by name
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class(name.into())
    }

    /// Contract type by name
    pub fn contract(name: impl Into<String>) -> Self {
        TypeRef::Contract(name.into())
    }

    /// Array type with the given component
    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    /// Check if this is a primitive type
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Check if this is `void`
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Check if this is an array type
    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// Check if this type holds references (and therefore accepts null)
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeRef::Void | TypeRef::Primitive(_))
    }

    /// Component type of an array type
    pub fn component_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Check if a contract type appears anywhere in this type
    pub fn mentions_contract(&self) -> bool {
        match self {
            TypeRef::Contract(_) => true,
            TypeRef::Array(component) => component.mentions_contract(),
            _ => false,
        }
    }

    /// Value a freshly allocated slot of this type starts with
    pub fn default_value(&self) -> Value {
        match self {
            TypeRef::Primitive(primitive) => primitive.default_value(),
            _ => Value::Null,
        }
    }

    /// Parse the textual form (see module docs)
    pub fn parse(text: &str) -> Option<Self> {
        let mut base = text.trim();
        let mut dimensions = 0;
        while let Some(stripped) = base.strip_suffix("[]") {
            base = stripped.trim_end();
            dimensions += 1;
        }

        let mut ty = match base {
            "void" if dimensions == 0 => TypeRef::Void,
            "void" => return None,
            "boolean" | "bool" => TypeRef::BOOL,
            "int" | "i32" => TypeRef::I32,
            "long" | "i64" => TypeRef::I64,
            "double" | "f64" => TypeRef::F64,
            "char" => TypeRef::CHAR,
            "String" | "str" => TypeRef::Str,
            "Object" | "any" => TypeRef::Any,
            _ => {
                if let Some(contract) = base.strip_prefix('@') {
                    if !is_type_name(contract) {
                        return None;
                    }
                    TypeRef::Contract(contract.to_string())
                } else if is_type_name(base) {
                    TypeRef::Class(base.to_string())
                } else {
                    return None;
                }
            }
        };

        for _ in 0..dimensions {
            ty = TypeRef::array_of(ty);
        }
        Some(ty)
    }
}

fn is_type_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '$')
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Primitive(primitive) => write!(f, "{}", primitive.name()),
            TypeRef::Str => write!(f, "String"),
            TypeRef::Any => write!(f, "Object"),
            TypeRef::Class(name) => write!(f, "{}", name),
            TypeRef::Contract(name) => write!(f, "@{}", name),
            TypeRef::Array(component) => write!(f, "{}[]", component),
        }
    }
}

/// Render a parameter list as `(int, @Point, String[])`
pub fn signature_string(params: &[TypeRef]) -> String {
    let rendered: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("({})", rendered.join(", "))
}
