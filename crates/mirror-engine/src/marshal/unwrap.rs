//! Mirror-side values and types to target-side

use mirror_sdk::{MirrorError, MirrorResult, TypeRef, Value};

use crate::dispatch::MirrorInvocationHandler;
use crate::metadata::ContractMetadata;

/// Converts mirror-side values and types into what the hidden API expects
#[derive(Debug, Clone)]
pub struct Unwrapper {
    metadata: ContractMetadata,
}

impl Unwrapper {
    /// Create an unwrapper resolving contracts through `metadata`
    pub fn new(metadata: ContractMetadata) -> Self {
        Self { metadata }
    }

    /// Unwrap a value.
    ///
    /// A mirror instance becomes its bound target object. Arrays are rebuilt
    /// element-wise when their element type mentions a contract or a proxy
    /// sits anywhere inside them, at any nesting depth; primitive arrays and
    /// other values pass through unchanged.
    pub fn unwrap_value(&self, value: &Value) -> MirrorResult<Value> {
        match value {
            Value::Proxy(proxy) => Ok(match proxy.handler_as::<MirrorInvocationHandler>() {
                Some(handler) => Value::Object(handler.target().clone()),
                None => value.clone(),
            }),
            Value::Array(array) if array.element_type().is_primitive() => Ok(value.clone()),
            Value::Array(array) => {
                if !array.element_type().mentions_contract() && !holds_proxy(value) {
                    return Ok(value.clone());
                }
                let element_type = self.unwrap_type(array.element_type())?;
                let elements = array
                    .elements()
                    .iter()
                    .map(|element| self.unwrap_value(element))
                    .collect::<MirrorResult<Vec<_>>>()?;
                Ok(Value::array(element_type, elements))
            }
            _ => Ok(value.clone()),
        }
    }

    /// Unwrap every argument of a call
    pub fn unwrap_args(&self, args: &[Value]) -> MirrorResult<Vec<Value>> {
        args.iter().map(|arg| self.unwrap_value(arg)).collect()
    }

    /// Unwrap a declared type: contract types become their target class,
    /// arrays recurse, everything else passes through.
    pub fn unwrap_type(&self, ty: &TypeRef) -> MirrorResult<TypeRef> {
        match ty {
            TypeRef::Array(component) => Ok(TypeRef::array_of(self.unwrap_type(component)?)),
            TypeRef::Contract(name) => {
                let unresolved = |source: MirrorError| {
                    MirrorError::Unwrapping(format!(
                        "cannot resolve mirror type @{}: {}",
                        name, source
                    ))
                };
                let contract = self.metadata.contract(name).map_err(unresolved)?;
                let class = self.metadata.target_class_of(&contract).map_err(unresolved)?;
                Ok(TypeRef::class(class.name()))
            }
            other => Ok(other.clone()),
        }
    }

    /// Unwrap a parameter list
    pub fn unwrap_types(&self, types: &[TypeRef]) -> MirrorResult<Vec<TypeRef>> {
        types.iter().map(|ty| self.unwrap_type(ty)).collect()
    }
}

fn holds_proxy(value: &Value) -> bool {
    match value {
        Value::Proxy(_) => true,
        Value::Array(array) if !array.element_type().is_primitive() => {
            array.elements().iter().any(holds_proxy)
        }
        _ => false,
    }
}
