//! Target-side values to mirror-side

use mirror_sdk::{MirrorError, MirrorResult, TypeRef, Value};

use super::MirrorSpawner;

/// Converts values produced by the hidden API into their declared mirror type
#[derive(Debug, Clone, Copy, Default)]
pub struct Wrapper;

impl Wrapper {
    /// Create a wrapper
    pub fn new() -> Self {
        Self
    }

    /// Wrap `value` against `declared`.
    ///
    /// Contract types get a fresh mirror bound to the raw object; arrays of
    /// contract types are wrapped element-wise; anything else passes through.
    /// A `void` declaration discards the value.
    pub fn wrap(
        &self,
        spawner: &dyn MirrorSpawner,
        value: Value,
        declared: &TypeRef,
    ) -> MirrorResult<Value> {
        if value.is_null() {
            return Ok(value);
        }
        match declared {
            TypeRef::Void => Ok(Value::Null),
            TypeRef::Array(component) => {
                let array = value.as_array().ok_or_else(|| {
                    MirrorError::Configuration(format!(
                        "declared array type {} but the hidden member produced {}",
                        declared,
                        value.type_name()
                    ))
                })?;
                if !component.mentions_contract() {
                    return Ok(value);
                }
                let elements = array
                    .elements()
                    .iter()
                    .map(|element| self.wrap(spawner, element.clone(), component))
                    .collect::<MirrorResult<Vec<_>>>()?;
                Ok(Value::array(component.as_ref().clone(), elements))
            }
            TypeRef::Contract(name) => match value {
                Value::Object(object) => spawner.spawn_mirror(name, object).map(Value::Proxy),
                Value::Proxy(proxy) if proxy.contract().name() == name => Ok(Value::Proxy(proxy)),
                other => Err(MirrorError::Wrapping(format!(
                    "cannot wrap {} as @{}",
                    other.type_name(),
                    name
                ))),
            },
            _ => Ok(value),
        }
    }
}
