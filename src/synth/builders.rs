//! Straight-line statement sequences for individual operations
//!
//! Operands all come out of the abstraction register, and none of these introduce control flow.

use super::register::AbstractionRegister;
use super::Error;
use crate::jvm::ir::{BodyBuilder, Constant, InvokeExpr, InvokeKind, Local, Rvalue, Stmt, Value};
use crate::jvm::{ClassId, FieldType, MethodId, RefType};

/// Allocate an object and run the given constructor on it
///
/// If the class declares a static initializer, it is invoked right after the constructor.
pub fn create_object<'g>(
    code: &mut BodyBuilder<'g>,
    register: &mut AbstractionRegister<'g>,
    constructor: MethodId<'g>,
) -> Result<Local, Error> {
    let class = constructor.class;
    if !constructor.is_constructor() {
        return Err(Error::MalformedSummary(format!(
            "{:?} is not a constructor",
            constructor
        )));
    }
    if class.is_interface() || class.is_abstract() {
        return Err(Error::MalformedSummary(format!(
            "{:?} can't be instantiated",
            class
        )));
    }

    let object = code.fresh_local(FieldType::object(class))?;
    code.push(Stmt::Assign(object, Rvalue::New(class)));
    let arguments = load_arguments(code, register, constructor)?;
    code.push(Stmt::Invoke(InvokeExpr {
        kind: InvokeKind::Special,
        method: constructor,
        receiver: Some(object),
        arguments,
    }));
    if let Some(static_initializer) = class.static_initializer() {
        code.push(Stmt::Invoke(InvokeExpr {
            kind: InvokeKind::Static,
            method: static_initializer,
            receiver: None,
            arguments: vec![],
        }));
    }
    log::debug!("Allocated {:?} through {:?}", class, constructor);

    Ok(object)
}

/// Allocate a one-dimensional array with the given element type
pub fn create_array<'g>(
    code: &mut BodyBuilder<'g>,
    element_type: FieldType<ClassId<'g>>,
    length: i32,
) -> Result<Local, Error> {
    let array = code.fresh_local(FieldType::Ref(RefType::array(element_type)))?;
    code.push(Stmt::Assign(
        array,
        Rvalue::NewArray {
            element_type,
            length: Value::Constant(Constant::Int(length)),
        },
    ));
    Ok(array)
}

/// Build a call with the given dispatch kind
///
/// The receiver and arguments are loaded from the register. The dispatch kind must fit the
/// callee: static calls go to static methods, interface calls to interface methods, virtual calls
/// to class methods. Constructors can't be called this way (they go through object creation).
pub fn build_invoke<'g>(
    code: &mut BodyBuilder<'g>,
    register: &mut AbstractionRegister<'g>,
    method: MethodId<'g>,
    kind: InvokeKind,
) -> Result<InvokeExpr<'g>, Error> {
    let malformed = |reason: &str| {
        Err(Error::MalformedSummary(format!(
            "{} {:?}: {}",
            kind.keyword(),
            method,
            reason
        )))
    };

    if method.is_constructor() {
        return malformed("constructors are only run on freshly created objects");
    }
    match kind {
        InvokeKind::Static if !method.is_static() => return malformed("instance method"),
        InvokeKind::Special | InvokeKind::Virtual | InvokeKind::Interface
            if method.is_static() =>
        {
            return malformed("static method")
        }
        InvokeKind::Virtual if method.class.is_interface() => {
            return malformed("method is declared on an interface")
        }
        InvokeKind::Interface if !method.class.is_interface() => {
            return malformed("method is declared on a class")
        }
        _ => (),
    }

    let receiver = match kind {
        InvokeKind::Static => None,
        _ => Some(register.load_ref(code, RefType::Object(method.class))?),
    };
    let arguments = load_arguments(code, register, method)?;
    log::debug!("Calling {:?} with {}", method, kind.keyword());

    Ok(InvokeExpr {
        kind,
        method,
        receiver,
        arguments,
    })
}

fn load_arguments<'g>(
    code: &mut BodyBuilder<'g>,
    register: &mut AbstractionRegister<'g>,
    method: MethodId<'g>,
) -> Result<Vec<Value>, Error> {
    method
        .descriptor
        .parameters
        .iter()
        .map(|parameter| register.load(code, *parameter))
        .collect()
}

/// Return from the method, with a value loaded from the register if the method isn't `void`
pub fn build_return<'g>(
    code: &mut BodyBuilder<'g>,
    register: &mut AbstractionRegister<'g>,
) -> Result<(), Error> {
    let value = match code.method().descriptor.return_type {
        Some(return_type) => Some(register.load(code, return_type)?),
        None => None,
    };
    code.push(Stmt::Return(value));
    Ok(())
}

/// Narrow the register to an exception type and throw it
pub fn build_throw<'g>(
    code: &mut BodyBuilder<'g>,
    register: &mut AbstractionRegister<'g>,
    exception: ClassId<'g>,
) -> Result<Local, Error> {
    let thrown = register.load_ref(code, RefType::Object(exception))?;
    code.push(Stmt::Throw(thrown));
    Ok(thrown)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::{ClassData, ClassGraph, ClassGraphArenas, MethodData};
    use crate::jvm::{
        BinaryName, ClassAccessFlags, MethodAccessFlags, MethodDescriptor, Name, UnqualifiedName,
    };

    #[test]
    fn objects_run_constructor_then_static_initializer() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;
        let string = java.classes.lang.string;

        let config = class_graph
            .add_class(ClassData::new(
                BinaryName::from_str("lib/Config").unwrap(),
                object,
                ClassAccessFlags::PUBLIC,
            ))
            .unwrap();
        let constructor = class_graph
            .add_method(MethodData::new(
                config,
                UnqualifiedName::INIT,
                MethodDescriptor {
                    parameters: vec![FieldType::object(string), FieldType::int()],
                    return_type: None,
                },
                MethodAccessFlags::PUBLIC,
            ))
            .unwrap();
        let static_initializer = class_graph
            .add_method(MethodData::new(
                config,
                UnqualifiedName::CLINIT,
                MethodDescriptor::VOID,
                MethodAccessFlags::STATIC,
            ))
            .unwrap();
        let load = class_graph
            .add_method(MethodData::new(
                config,
                UnqualifiedName::from_str("load").unwrap(),
                MethodDescriptor::VOID,
                MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            ))
            .unwrap();

        let mut code = BodyBuilder::new(load);
        let mut register =
            AbstractionRegister::declare(&mut code, object, &UnqualifiedName::REGISTER).unwrap();
        let created = create_object(&mut code, &mut register, constructor).unwrap();

        let statements = code.statements();
        assert_eq!(statements[0], Stmt::Assign(created, Rvalue::New(config)));
        let invokes: Vec<&InvokeExpr> = statements
            .iter()
            .filter_map(|statement| match statement {
                Stmt::Invoke(invoke) => Some(invoke),
                _ => None,
            })
            .collect();
        assert_eq!(invokes.len(), 2);
        assert_eq!(invokes[0].method, constructor);
        assert_eq!(invokes[0].receiver, Some(created));
        assert_eq!(invokes[0].arguments.len(), 2);
        assert_eq!(invokes[0].arguments[1], Value::Constant(Constant::Int(0)));
        assert_eq!(invokes[1].method, static_initializer);
        assert_eq!(invokes[1].kind, InvokeKind::Static);

        // Only real constructors qualify
        assert!(matches!(
            create_object(&mut code, &mut register, load),
            Err(Error::MalformedSummary(_))
        ));
    }

    #[test]
    fn dispatch_kind_must_fit_callee() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let task = class_graph
            .add_class(ClassData::new(
                BinaryName::from_str("lib/Task").unwrap(),
                object,
                ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
            ))
            .unwrap();
        let run = class_graph
            .add_method(MethodData::new(
                task,
                UnqualifiedName::from_str("run").unwrap(),
                MethodDescriptor::VOID,
                MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
            ))
            .unwrap();

        let mut code = BodyBuilder::new(run);
        let mut register =
            AbstractionRegister::declare(&mut code, object, &UnqualifiedName::REGISTER).unwrap();

        for kind in [InvokeKind::Static, InvokeKind::Virtual] {
            assert!(matches!(
                build_invoke(&mut code, &mut register, run, kind),
                Err(Error::MalformedSummary(_))
            ));
        }
        assert!(code.statements().is_empty());

        let invoke = build_invoke(&mut code, &mut register, run, InvokeKind::Interface).unwrap();
        let receiver = invoke.receiver.unwrap();
        assert_eq!(code.local_type(receiver), Some(FieldType::object(task)));
        assert!(invoke.arguments.is_empty());
    }
}
