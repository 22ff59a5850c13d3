//! Value marshalling between mirror-side and target-side representations
//!
//! - [`Unwrapper`]: mirror arguments and parameter types to target form
//! - [`Wrapper`]: target results to their declared mirror type
//!
//! Only the contract graph is traversed: mirrors, arrays of mirrors, and
//! nothing else. Primitives, strings and non-mirror objects pass through.

mod unwrap;
mod wrap;

pub use unwrap::Unwrapper;
pub use wrap::Wrapper;

use mirror_sdk::{MirrorResult, ObjectRef, Proxy};

/// Builds a mirror instance of a named contract around a raw object
pub trait MirrorSpawner {
    /// Create a mirror of `contract` bound to `target`
    fn spawn_mirror(&self, contract: &str, target: ObjectRef) -> MirrorResult<Proxy>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::Arc;

    use mirror_sdk::{
        ClassBuilder, ClassRegistry, Contract, ContractMethod, ContractRegistry,
        DefaultProxyFactory, InvocationHandler, MirrorError, ProxyFactory, TypeRef, Value,
    };
    use parking_lot::Mutex;

    use crate::metadata::ContractMetadata;

    struct Inert;

    impl InvocationHandler for Inert {
        fn invoke(&self, _: &Proxy, _: &ContractMethod, _: &[Value]) -> MirrorResult<Value> {
            Ok(Value::Null)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Spawns inert proxies and remembers what it was asked for
    #[derive(Default)]
    struct RecordingSpawner {
        factory: DefaultProxyFactory,
        spawned: Mutex<Vec<(String, ObjectRef)>>,
    }

    impl MirrorSpawner for RecordingSpawner {
        fn spawn_mirror(&self, contract: &str, target: ObjectRef) -> MirrorResult<Proxy> {
            self.spawned.lock().push((contract.to_string(), target));
            Ok(self
                .factory
                .create(Arc::new(Contract::mirror(contract, "test.Point")), Arc::new(Inert)))
        }
    }

    fn metadata() -> ContractMetadata {
        let mut classes = ClassRegistry::new();
        classes.define(ClassBuilder::new("test.Point"));
        let mut contracts = ContractRegistry::new();
        contracts.register(Contract::mirror("Point", "test.Point"));
        contracts.register(Contract::mirror("Ghost", "test.Missing"));
        ContractMetadata::new(Arc::new(contracts), Arc::new(classes))
    }

    // ========================================================================
    // Wrapper
    // ========================================================================

    #[test]
    fn test_wrap_passes_primitives_and_plain_objects() {
        let spawner = RecordingSpawner::default();
        let wrapper = Wrapper::new();
        assert_eq!(
            wrapper.wrap(&spawner, Value::I32(3), &TypeRef::I32).unwrap(),
            Value::I32(3)
        );

        let object = ClassBuilder::new("test.Point").build().allocate();
        let wrapped = wrapper
            .wrap(&spawner, Value::Object(object.clone()), &TypeRef::class("test.Point"))
            .unwrap();
        assert_eq!(wrapped, Value::Object(object));
        assert!(spawner.spawned.lock().is_empty());
    }

    #[test]
    fn test_wrap_null_and_void() {
        let spawner = RecordingSpawner::default();
        let wrapper = Wrapper::new();
        assert!(wrapper
            .wrap(&spawner, Value::Null, &TypeRef::contract("Point"))
            .unwrap()
            .is_null());
        assert!(wrapper
            .wrap(&spawner, Value::I32(1), &TypeRef::Void)
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_wrap_contract_spawns_mirror() {
        let spawner = RecordingSpawner::default();
        let object = ClassBuilder::new("test.Point").build().allocate();
        let wrapped = Wrapper::new()
            .wrap(&spawner, Value::Object(object.clone()), &TypeRef::contract("Point"))
            .unwrap();
        assert!(wrapped.as_proxy().is_some());

        let spawned = spawner.spawned.lock();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].0, "Point");
        assert!(Arc::ptr_eq(&spawned[0].1, &object));
    }

    #[test]
    fn test_wrap_array_element_wise() {
        let spawner = RecordingSpawner::default();
        let class = ClassBuilder::new("test.Point").build();
        let raw = Value::array(
            TypeRef::class("test.Point"),
            vec![Value::Object(class.allocate()), Value::Null, Value::Object(class.allocate())],
        );
        let declared = TypeRef::array_of(TypeRef::contract("Point"));
        let wrapped = Wrapper::new().wrap(&spawner, raw, &declared).unwrap();

        let array = wrapped.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.element_type(), &TypeRef::contract("Point"));
        assert!(array.get(0).unwrap().as_proxy().is_some());
        assert!(array.get(1).unwrap().is_null());
        assert!(array.get(2).unwrap().as_proxy().is_some());
        assert_eq!(spawner.spawned.lock().len(), 2);
    }

    #[test]
    fn test_wrap_declared_array_mismatch() {
        let spawner = RecordingSpawner::default();
        let result = Wrapper::new().wrap(
            &spawner,
            Value::I32(1),
            &TypeRef::array_of(TypeRef::contract("Point")),
        );
        assert!(matches!(result, Err(MirrorError::Configuration(_))));
    }

    // ========================================================================
    // Unwrapper
    // ========================================================================

    #[test]
    fn test_unwrap_type() {
        let unwrapper = Unwrapper::new(metadata());
        assert_eq!(unwrapper.unwrap_type(&TypeRef::I32).unwrap(), TypeRef::I32);
        assert_eq!(
            unwrapper.unwrap_type(&TypeRef::contract("Point")).unwrap(),
            TypeRef::class("test.Point")
        );
        assert_eq!(
            unwrapper
                .unwrap_type(&TypeRef::array_of(TypeRef::array_of(TypeRef::contract("Point"))))
                .unwrap(),
            TypeRef::array_of(TypeRef::array_of(TypeRef::class("test.Point")))
        );
        assert_eq!(
            unwrapper.unwrap_type(&TypeRef::class("test.Other")).unwrap(),
            TypeRef::class("test.Other")
        );
    }

    #[test]
    fn test_unwrap_type_unresolvable() {
        let unwrapper = Unwrapper::new(metadata());
        assert!(matches!(
            unwrapper.unwrap_type(&TypeRef::contract("Ghost")),
            Err(MirrorError::Unwrapping(_))
        ));
        assert!(matches!(
            unwrapper.unwrap_type(&TypeRef::contract("Nobody")),
            Err(MirrorError::Unwrapping(_))
        ));
    }

    #[test]
    fn test_unwrap_value_pass_through() {
        let unwrapper = Unwrapper::new(metadata());
        assert_eq!(unwrapper.unwrap_value(&Value::Null).unwrap(), Value::Null);
        assert_eq!(unwrapper.unwrap_value(&Value::F64(1.5)).unwrap(), Value::F64(1.5));

        let ints = Value::array(TypeRef::I32, vec![Value::I32(1)]);
        let unwrapped = unwrapper.unwrap_value(&ints).unwrap();
        assert!(Arc::ptr_eq(
            unwrapped.as_array().unwrap(),
            ints.as_array().unwrap()
        ));

        // Proxies not bound to a target instance stay as they are
        let proxy = DefaultProxyFactory::new()
            .create(Arc::new(Contract::unmarked("Other")), Arc::new(Inert));
        let value = Value::Proxy(proxy);
        assert_eq!(unwrapper.unwrap_value(&value).unwrap(), value);
    }
}
