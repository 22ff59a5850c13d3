//! Shared fixtures: a small hidden class hierarchy, the failure kinds it
//! raises, and the contracts that reach into it.

#![allow(dead_code)]

use std::sync::Arc;

use mirror_engine::{EngineConfig, MirrorEngine, MirrorEngineBuilder};
use mirror_sdk::{
    ClassBuilder, ClassRegistry, ConstructorDescriptor, Contract, ContractMethod, Failure,
    FailureClassBuilder, FailureRegistry, FieldDescriptor, MethodDescriptor, ObjectRef, TypeRef,
    Value,
};

pub const BASE: &str = "com.acme.Base";
pub const HIDDEN: &str = "com.acme.Hidden";
pub const OTHER: &str = "com.acme.Other";

pub const HIDDEN_FAILURE: &str = "com.acme.HiddenException";
pub const IO_FAILURE: &str = "com.acme.IOException";
pub const WRAPPED: &str = "app.WrappedException";
pub const PLAIN: &str = "app.PlainException";
pub const UNWRAPPABLE: &str = "app.UnwrappableException";
pub const MIRRORED: &str = "app.MirroredHiddenException";

// ===== Failure kinds =====

pub fn failures() -> FailureRegistry {
    let mut failures = FailureRegistry::new();
    let exception = Arc::clone(failures.exception());

    failures.define(FailureClassBuilder::new(HIDDEN_FAILURE).extends(&exception));
    failures.define(FailureClassBuilder::new(IO_FAILURE).extends(&exception));
    failures.define(FailureClassBuilder::new(WRAPPED).extends(&exception));
    failures.define(
        FailureClassBuilder::new(PLAIN)
            .extends(&exception)
            .cause_constructor(false),
    );
    failures.define(
        FailureClassBuilder::new(UNWRAPPABLE)
            .extends(&exception)
            .cause_constructor(false)
            .no_arg_constructor(false),
    );
    failures.define(
        FailureClassBuilder::new(MIRRORED)
            .extends(&exception)
            .mirrors(HIDDEN_FAILURE),
    );
    failures
}

// ===== Hidden classes =====

fn int_arg(value: &Value) -> i32 {
    value.as_i32().unwrap_or_default()
}

fn read_int(this: Option<&ObjectRef>, field: &str) -> i32 {
    this.and_then(|object| object.get(field))
        .and_then(|value| value.as_i32())
        .unwrap_or_default()
}

pub fn classes(failures: &FailureRegistry) -> ClassRegistry {
    let hidden_failure = Arc::clone(failures.get(HIDDEN_FAILURE).expect("fixture failure"));
    let io_failure = Arc::clone(failures.get(IO_FAILURE).expect("fixture failure"));
    let runtime = Arc::clone(failures.runtime_exception());
    let rejected = Arc::clone(&hidden_failure);
    let copy_failure = Arc::clone(&runtime);
    let siblings_failure = Arc::clone(&runtime);

    let mut classes = ClassRegistry::new();

    let base = classes.define(
        ClassBuilder::new(BASE)
            .field(
                FieldDescriptor::new("inherited", TypeRef::Str)
                    .private()
                    .with_initial("from base"),
            )
            .method(
                MethodDescriptor::new("describe", vec![], TypeRef::Str, |frame| {
                    let inherited = frame
                        .this()
                        .and_then(|this| this.get("inherited"))
                        .and_then(|value| value.as_str().map(str::to_string))
                        .unwrap_or_default();
                    Ok(Value::string(format!("base:{}", inherited)))
                })
                .private(),
            )
            .method(
                MethodDescriptor::new("baseValue", vec![], TypeRef::I32, |_| Ok(Value::I32(1)))
                    .protected(),
            ),
    );

    classes.define(
        ClassBuilder::new(HIDDEN)
            .extends(&base)
            .field(FieldDescriptor::new("x", TypeRef::I32).private().with_initial(42))
            .field(
                FieldDescriptor::new("label", TypeRef::Str)
                    .private()
                    .with_initial("unnamed"),
            )
            .field(FieldDescriptor::new("peer", TypeRef::class(HIDDEN)).private())
            .field(
                FieldDescriptor::new("counter", TypeRef::I32)
                    .private()
                    .as_static()
                    .with_initial(7),
            )
            .constructor(ConstructorDescriptor::new(vec![], |_| Ok(())).private())
            .constructor(ConstructorDescriptor::new(
                vec![TypeRef::I32, TypeRef::Str],
                |frame| {
                    if let Some(this) = frame.this() {
                        this.set("x", frame.arg(0).clone());
                        this.set("label", frame.arg(1).clone());
                    }
                    Ok(())
                },
            ))
            .constructor(ConstructorDescriptor::new(vec![TypeRef::Str], move |frame| {
                Err(Failure::with_message(
                    &rejected,
                    format!("rejected {}", frame.arg(0).as_str().unwrap_or_default()),
                ))
            }))
            .method(MethodDescriptor::new("f", vec![TypeRef::I32], TypeRef::Str, |_| {
                Ok(Value::from("f(int)"))
            }))
            .method(MethodDescriptor::new(
                "f",
                vec![TypeRef::I32, TypeRef::F64],
                TypeRef::Str,
                |_| Ok(Value::from("f(int,double)")),
            ))
            .method(
                MethodDescriptor::new("add", vec![TypeRef::I32], TypeRef::I32, |frame| {
                    Ok(Value::I32(read_int(frame.this(), "x") + int_arg(frame.arg(0))))
                })
                .private(),
            )
            .method(MethodDescriptor::new("label", vec![], TypeRef::Str, |frame| {
                Ok(frame
                    .this()
                    .and_then(|this| this.get("label"))
                    .unwrap_or(Value::Null))
            }))
            .method(
                MethodDescriptor::new("twice", vec![TypeRef::I32], TypeRef::I32, |frame| {
                    Ok(Value::I32(int_arg(frame.arg(0)) * 2))
                })
                .private()
                .as_static(),
            )
            .method(
                MethodDescriptor::new("copy", vec![], TypeRef::class(HIDDEN), move |frame| {
                    let x = read_int(frame.this(), "x");
                    frame
                        .classes()
                        .instantiate(HIDDEN, &[Value::I32(x), Value::from("copy")])
                        .map(Value::Object)
                        .map_err(|e| Failure::with_message(&copy_failure, e.to_string()))
                })
                .private(),
            )
            .method(MethodDescriptor::new(
                "sameX",
                vec![TypeRef::class(HIDDEN)],
                TypeRef::BOOL,
                |frame| {
                    let other = frame.arg(0).as_object();
                    Ok(Value::Bool(
                        read_int(frame.this(), "x") == read_int(other, "x"),
                    ))
                },
            ))
            .method(MethodDescriptor::new(
                "isSelf",
                vec![TypeRef::class(HIDDEN)],
                TypeRef::BOOL,
                |frame| {
                    let same = match (frame.this(), frame.arg(0).as_object()) {
                        (Some(this), Some(other)) => Arc::ptr_eq(this, other),
                        _ => false,
                    };
                    Ok(Value::Bool(same))
                },
            ))
            .method(MethodDescriptor::new(
                "siblings",
                vec![TypeRef::I32],
                TypeRef::array_of(TypeRef::class(HIDDEN)),
                move |frame| {
                    let count = int_arg(frame.arg(0));
                    let elements = (0..count)
                        .map(|i| {
                            let args = [Value::I32(i), Value::string(format!("s{}", i))];
                            frame
                                .classes()
                                .instantiate(HIDDEN, &args)
                                .map(Value::Object)
                                .map_err(|e| {
                                    Failure::with_message(&siblings_failure, e.to_string())
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::array(TypeRef::class(HIDDEN), elements))
                },
            ))
            .method(MethodDescriptor::new(
                "sumX",
                vec![TypeRef::array_of(TypeRef::class(HIDDEN))],
                TypeRef::I32,
                |frame| {
                    let total = frame
                        .arg(0)
                        .as_array()
                        .map(|array| {
                            array
                                .elements()
                                .iter()
                                .map(|element| read_int(element.as_object(), "x"))
                                .sum::<i32>()
                        })
                        .unwrap_or_default();
                    Ok(Value::I32(total))
                },
            ))
            .method(MethodDescriptor::new(
                "xs",
                vec![],
                TypeRef::array_of(TypeRef::I32),
                |frame| {
                    let x = read_int(frame.this(), "x");
                    Ok(Value::array(TypeRef::I32, vec![Value::I32(x), Value::I32(x + 1)]))
                },
            ))
            .method(
                MethodDescriptor::new("risky", vec![], TypeRef::Void, move |_| {
                    Err(Failure::with_message(&hidden_failure, "risky business"))
                })
                .private(),
            )
            .method(MethodDescriptor::new("crash", vec![], TypeRef::Void, move |_| {
                Err(Failure::with_message(&runtime, "boom"))
            }))
            .method(MethodDescriptor::new("ioFail", vec![], TypeRef::Void, move |_| {
                Err(Failure::with_message(&io_failure, "disk gone"))
            })),
    );

    classes.define(
        ClassBuilder::new(OTHER).constructor(ConstructorDescriptor::new(vec![], |_| Ok(()))),
    );
    classes
}

// ===== Contracts =====

pub fn hidden_contract() -> Contract {
    let hidden = || TypeRef::contract("Hidden");
    Contract::mirror("Hidden", HIDDEN)
        .method(ContractMethod::new("x").returns(TypeRef::I32).get_field("x"))
        .method(ContractMethod::new("setX").param(TypeRef::I32).set_field("x"))
        .method(ContractMethod::new("label").returns(TypeRef::Str))
        .method(
            ContractMethod::new("inherited")
                .returns(TypeRef::Str)
                .get_field("inherited"),
        )
        .method(
            ContractMethod::new("counter")
                .returns(TypeRef::I32)
                .get_field("counter"),
        )
        .method(
            ContractMethod::new("setCounter")
                .param(TypeRef::I32)
                .set_field("counter"),
        )
        .method(ContractMethod::new("peer").returns(hidden()).get_field("peer"))
        .method(ContractMethod::new("setPeer").param(hidden()).set_field("peer"))
        .method(ContractMethod::new("f").param(TypeRef::I32).returns(TypeRef::Str))
        .method(
            ContractMethod::new("f")
                .params(vec![TypeRef::I32, TypeRef::F64])
                .returns(TypeRef::Str),
        )
        .method(ContractMethod::new("add").param(TypeRef::I32).returns(TypeRef::I32))
        .method(ContractMethod::new("twice").param(TypeRef::I32).returns(TypeRef::I32))
        .method(ContractMethod::new("describe").returns(TypeRef::Str))
        .method(ContractMethod::new("baseValue").returns(TypeRef::I32))
        .method(ContractMethod::new("copy").returns(hidden()))
        .method(ContractMethod::new("sameX").param(hidden()).returns(TypeRef::BOOL))
        .method(ContractMethod::new("isSelf").param(hidden()).returns(TypeRef::BOOL))
        .method(
            ContractMethod::new("siblings")
                .param(TypeRef::I32)
                .returns(TypeRef::array_of(hidden())),
        )
        .method(
            ContractMethod::new("sumX")
                .param(TypeRef::array_of(hidden()))
                .returns(TypeRef::I32),
        )
        .method(ContractMethod::new("xs").returns(TypeRef::array_of(TypeRef::I32)))
        .method(ContractMethod::new("risky").wrap(HIDDEN_FAILURE, WRAPPED))
        .method(ContractMethod::new("crash"))
        .method(ContractMethod::new("ioFail"))
        .method(ContractMethod::new("missing").returns(TypeRef::I32))
        .method(ContractMethod::new("add").param(TypeRef::I64).returns(TypeRef::I64))
}

pub fn contracts() -> Vec<Contract> {
    vec![
        hidden_contract(),
        Contract::mirror("HiddenDeclared", HIDDEN)
            .method(ContractMethod::new("ioFail").throws(IO_FAILURE))
            .method(ContractMethod::new("risky").throws(MIRRORED)),
        Contract::mirror("HiddenPlainWrap", HIDDEN)
            .method(ContractMethod::new("risky").wrap(HIDDEN_FAILURE, PLAIN)),
        Contract::mirror("HiddenBadWrap", HIDDEN)
            .method(ContractMethod::new("risky").wrap(HIDDEN_FAILURE, UNWRAPPABLE)),
        Contract::mirror("HiddenOrdered", HIDDEN).method(
            ContractMethod::new("risky")
                .wrap("Exception", PLAIN)
                .wrap(HIDDEN_FAILURE, WRAPPED),
        ),
        Contract::creator("HiddenCreator")
            .method(
                ContractMethod::new("create")
                    .params(vec![TypeRef::I32, TypeRef::Str])
                    .returns(TypeRef::contract("Hidden"))
                    .constructor(),
            )
            .method(
                ContractMethod::new("blank")
                    .returns(TypeRef::contract("Hidden"))
                    .constructor(),
            )
            .method(
                ContractMethod::new("reject")
                    .param(TypeRef::Str)
                    .returns(TypeRef::contract("Hidden"))
                    .constructor()
                    .wrap(HIDDEN_FAILURE, WRAPPED),
            ),
        Contract::factory("HiddenFactory", "Hidden").method(
            ContractMethod::new("make")
                .params(vec![TypeRef::I32, TypeRef::Str])
                .returns(TypeRef::contract("Hidden"))
                .constructor(),
        ),
    ]
}

// ===== Engines =====

pub fn builder() -> MirrorEngineBuilder {
    let failures = failures();
    let classes = classes(&failures);
    contracts()
        .into_iter()
        .fold(MirrorEngine::builder(), |builder, contract| builder.contract(contract))
        .classes(classes)
        .failures(failures)
}

pub fn engine() -> MirrorEngine {
    builder().build()
}

pub fn engine_with(config: EngineConfig) -> MirrorEngine {
    builder().config(config).build()
}

/// A raw hidden instance with the given state
pub fn hidden(engine: &MirrorEngine, x: i32, label: &str) -> ObjectRef {
    engine
        .classes()
        .instantiate(HIDDEN, &[Value::I32(x), Value::from(label)])
        .expect("fixture instance")
}
