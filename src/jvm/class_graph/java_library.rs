use super::{ClassData, ClassGraph, ClassId, MethodData, MethodId};
use crate::jvm::{
    BinaryName, ClassAccessFlags, Error, MethodAccessFlags, MethodDescriptor, UnqualifiedName,
};
use elsa::FrozenVec;

/// Handles to the part of the JDK the synthesized code can refer to
#[derive(Copy, Clone)]
pub struct JavaLibrary<'g> {
    pub classes: JavaClasses<'g>,
    pub members: JavaMembers<'g>,
}

#[derive(Copy, Clone)]
pub struct JavaClasses<'g> {
    pub lang: LangClasses<'g>,
    pub io: IoClasses<'g>,
}

#[derive(Copy, Clone)]
pub struct LangClasses<'g> {
    pub object: ClassId<'g>,
    pub string: ClassId<'g>,
    pub cloneable: ClassId<'g>,
    pub throwable: ClassId<'g>,
    pub exception: ClassId<'g>,
    pub runtime_exception: ClassId<'g>,
    pub error: ClassId<'g>,
}

#[derive(Copy, Clone)]
pub struct IoClasses<'g> {
    pub serializable: ClassId<'g>,
}

/// Default constructors of the library classes
#[derive(Copy, Clone)]
pub struct JavaMembers<'g> {
    pub object_init: MethodId<'g>,
    pub string_init: MethodId<'g>,
    pub throwable_init: MethodId<'g>,
    pub exception_init: MethodId<'g>,
    pub runtime_exception_init: MethodId<'g>,
    pub error_init: MethodId<'g>,
}

impl<'g> JavaLibrary<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> Result<JavaLibrary<'g>, Error> {
        let classes = JavaClasses::add_to_graph(class_graph)?;
        let members = JavaMembers::add_to_graph(class_graph, &classes)?;
        Ok(JavaLibrary { classes, members })
    }
}

impl<'g> JavaClasses<'g> {
    fn add_to_graph(class_graph: &ClassGraph<'g>) -> Result<JavaClasses<'g>, Error> {
        let public = ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER;
        let public_interface =
            ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT;

        let object = class_graph.add_class(ClassData {
            name: BinaryName::OBJECT,
            superclass: None,
            interfaces: FrozenVec::new(),
            access_flags: public,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        })?;
        let cloneable = class_graph.add_class(ClassData::new(
            BinaryName::CLONEABLE,
            object,
            public_interface,
        ))?;
        let serializable = class_graph.add_class(ClassData::new(
            BinaryName::SERIALIZABLE,
            object,
            public_interface,
        ))?;

        let string = class_graph.add_class(ClassData::new(
            BinaryName::STRING,
            object,
            public | ClassAccessFlags::FINAL,
        ))?;
        string.add_interface(serializable);

        let throwable =
            class_graph.add_class(ClassData::new(BinaryName::THROWABLE, object, public))?;
        throwable.add_interface(serializable);
        let exception =
            class_graph.add_class(ClassData::new(BinaryName::EXCEPTION, throwable, public))?;
        let runtime_exception = class_graph.add_class(ClassData::new(
            BinaryName::RUNTIMEEXCEPTION,
            exception,
            public,
        ))?;
        let error = class_graph.add_class(ClassData::new(BinaryName::ERROR, throwable, public))?;

        Ok(JavaClasses {
            lang: LangClasses {
                object,
                string,
                cloneable,
                throwable,
                exception,
                runtime_exception,
                error,
            },
            io: IoClasses { serializable },
        })
    }
}

impl<'g> JavaMembers<'g> {
    fn add_to_graph(
        class_graph: &ClassGraph<'g>,
        classes: &JavaClasses<'g>,
    ) -> Result<JavaMembers<'g>, Error> {
        let default_constructor = |class: ClassId<'g>| {
            class_graph.add_method(MethodData::new(
                class,
                UnqualifiedName::INIT,
                MethodDescriptor::VOID,
                MethodAccessFlags::PUBLIC,
            ))
        };

        let lang = &classes.lang;
        Ok(JavaMembers {
            object_init: default_constructor(lang.object)?,
            string_init: default_constructor(lang.string)?,
            throwable_init: default_constructor(lang.throwable)?,
            exception_init: default_constructor(lang.exception)?,
            runtime_exception_init: default_constructor(lang.runtime_exception)?,
            error_init: default_constructor(lang.error)?,
        })
    }
}
