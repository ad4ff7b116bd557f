use super::{Error, Settings};
use crate::jvm::class_graph::{ClassData, ClassGraph, FieldData, JavaLibrary, MethodData};
use crate::jvm::ir::{
    Body, BodyBuilder, Constant, FieldRef, IdentityRef, InvokeExpr, InvokeKind, Stmt, Value,
};
use crate::jvm::{
    verifier, ClassAccessFlags, ClassId, FieldAccessFlags, FieldId, FieldType, MethodAccessFlags,
    MethodDescriptor, MethodId, Name, UnqualifiedName,
};

/// Synthetic class holding the opaque guard flag
///
/// The flag is only ever assigned `false` by the class's static initializer, but no
/// intra-procedural analysis can know that, so a branch on it can't be folded away.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GuardClass<'g> {
    pub class: ClassId<'g>,

    /// `public static boolean` flag
    pub field: FieldId<'g>,
}

/// Find the guard class, creating it if it isn't in the class graph yet
///
/// Calling this repeatedly returns the same class. A pre-existing class under the guard name
/// must look like a guard class (direct subclass of `Object` with a public static boolean field
/// of the right name), otherwise it is reported as a `DuplicateGuardClass`.
pub fn ensure_guard_class_exists<'g>(
    class_graph: &'g ClassGraph<'g>,
    java: &JavaLibrary<'g>,
    settings: &Settings,
) -> Result<GuardClass<'g>, Error> {
    if let Some(existing) = class_graph.lookup_class(&settings.guard_class_name) {
        return check_guard_shape(existing, java, settings);
    }

    let class = match class_graph.add_class(ClassData::new(
        settings.guard_class_name.clone(),
        java.classes.lang.object,
        ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER | ClassAccessFlags::SYNTHETIC,
    )) {
        Ok(class) => class,

        // Somebody else registered the name first: their class wins
        Err(crate::jvm::Error::DuplicateClass(_)) => {
            let existing = class_graph.require_class(&settings.guard_class_name)?;
            return check_guard_shape(existing, java, settings);
        }
        Err(err) => return Err(Error::Program(err)),
    };

    let field = class_graph.add_field(FieldData {
        class,
        name: settings.guard_field_name.clone(),
        descriptor: FieldType::boolean(),
        access_flags: FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC,
    })?;
    let constructor = class_graph.add_method(MethodData::new(
        class,
        UnqualifiedName::INIT,
        MethodDescriptor::VOID,
        MethodAccessFlags::PUBLIC,
    ))?;
    let static_initializer = class_graph.add_method(MethodData::new(
        class,
        UnqualifiedName::CLINIT,
        MethodDescriptor::VOID,
        MethodAccessFlags::STATIC,
    ))?;

    attach_verified(constructor_body(constructor, java)?, java)?;
    attach_verified(static_initializer_body(static_initializer, field), java)?;

    log::info!(
        "Created guard class {} with flag {:?}",
        settings.guard_class_name.as_str(),
        field
    );
    Ok(GuardClass { class, field })
}

fn check_guard_shape<'g>(
    class: ClassId<'g>,
    java: &JavaLibrary<'g>,
    settings: &Settings,
) -> Result<GuardClass<'g>, Error> {
    let mismatch = |reason: &str| {
        Err(Error::DuplicateGuardClass(format!(
            "{} {}",
            class.name.as_str(),
            reason
        )))
    };

    if class.is_interface() {
        return mismatch("is an interface");
    }
    if class.superclass != Some(java.classes.lang.object) {
        return mismatch("does not directly extend java/lang/Object");
    }
    let field = match class.lookup_field(&settings.guard_field_name) {
        Some(field) => field,
        None => return mismatch("has no guard field"),
    };
    let is_flag = field.is_static()
        && field.access_flags.contains(FieldAccessFlags::PUBLIC)
        && field.descriptor == FieldType::boolean();
    if !is_flag {
        return mismatch("has a guard field that is not a public static boolean");
    }

    log::debug!("Reusing guard class {}", class.name.as_str());
    Ok(GuardClass { class, field })
}

/// `this.<init>()` delegating straight to `Object.<init>()`
fn constructor_body<'g>(
    constructor: MethodId<'g>,
    java: &JavaLibrary<'g>,
) -> Result<Body<'g>, Error> {
    let class = constructor.class;
    let mut code = BodyBuilder::new(constructor);
    let this = code.fresh_local(FieldType::object(class))?;
    code.push(Stmt::Identity(this, IdentityRef::This(class)));
    code.push(Stmt::Invoke(InvokeExpr {
        kind: InvokeKind::Special,
        method: java.members.object_init,
        receiver: Some(this),
        arguments: vec![],
    }));
    code.push(Stmt::Return(None));
    Ok(code.result())
}

/// Explicitly clear the flag
fn static_initializer_body<'g>(static_initializer: MethodId<'g>, field: FieldId<'g>) -> Body<'g> {
    let mut code = BodyBuilder::new(static_initializer);
    code.push(Stmt::FieldStore(
        FieldRef { field, base: None },
        Value::Constant(Constant::Int(0)),
    ));
    code.push(Stmt::Return(None));
    code.result()
}

fn attach_verified<'g>(body: Body<'g>, java: &JavaLibrary<'g>) -> Result<(), Error> {
    let method = body.method;
    verifier::verify(&body, java).map_err(|error| Error::VerifierRejection {
        method: format!("{:?}", method),
        error,
    })?;
    method.attach_body(body)?;
    Ok(())
}
