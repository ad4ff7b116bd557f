use super::ir::Body;
use super::{
    BinaryName, ClassAccessFlags, Error, FieldAccessFlags, FieldType, MethodAccessFlags,
    MethodDescriptor, Name, RenderDescriptor, UnqualifiedName,
};
use crate::util::RefId;
use elsa::map::FrozenMap;
use elsa::FrozenVec;
use std::cell::OnceCell;
use std::fmt;
use std::fmt::Debug;
use typed_arena::Arena;

mod assignable;
mod java_library;

pub use assignable::*;
pub use java_library::*;

pub type ClassId<'g> = RefId<'g, ClassData<'g>>;
pub type MethodId<'g> = RefId<'g, MethodData<'g>>;
pub type FieldId<'g> = RefId<'g, FieldData<'g>>;

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
    method_arena: Arena<MethodData<'g>>,
    field_arena: Arena<FieldData<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
            method_arena: Arena::new(),
            field_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        Self::new()
    }
}

/// Program model: classes and interfaces, the members on them, and their supertype edges
///
/// Everything is arena-allocated and only ever grows, so ids handed out stay valid for the
/// lifetime of the graph. Registration is keyed by binary name and the first registration of a
/// name wins. The graph is not `Sync`: all mutation happens on the thread that owns it.
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    classes: FrozenMap<&'g BinaryName, &'g ClassData<'g>>,

    /// Classes in the order they were added
    class_order: FrozenVec<&'g ClassData<'g>>,
}

impl<'g> ClassGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        ClassGraph {
            arenas,
            classes: FrozenMap::new(),
            class_order: FrozenVec::new(),
        }
    }

    /// Find a class by binary name
    pub fn lookup_class(&'g self, name: &BinaryName) -> Option<ClassId<'g>> {
        self.classes.get(name).map(RefId)
    }

    /// Find a class by binary name, or fail with `MissingClass`
    pub fn require_class(&'g self, name: &BinaryName) -> Result<ClassId<'g>, Error> {
        self.lookup_class(name)
            .ok_or_else(|| Error::MissingClass(name.as_str().to_owned()))
    }

    /// All classes, in registration order
    pub fn classes(&'g self) -> impl Iterator<Item = ClassId<'g>> + 'g {
        self.class_order.iter().map(RefId)
    }

    /// Add a new class to the class graph
    ///
    /// Fails if the name is already taken, leaving the existing class untouched.
    pub fn add_class(&self, data: ClassData<'g>) -> Result<ClassId<'g>, Error> {
        if self.classes.get(&data.name).is_some() {
            return Err(Error::DuplicateClass(data.name.as_str().to_owned()));
        }
        let data: &'g ClassData<'g> = &*self.arenas.class_arena.alloc(data);
        self.classes.insert(&data.name, data);
        self.class_order.push(data);
        log::trace!("Registered class {:?}", data);
        Ok(RefId(data))
    }

    /// Add a field to the class graph and to its class
    pub fn add_field(&self, field: FieldData<'g>) -> Result<FieldId<'g>, Error> {
        if field.class.lookup_field(&field.name).is_some() {
            return Err(Error::DuplicateMember(format!("{:?}", field)));
        }
        let data: &'g FieldData<'g> = &*self.arenas.field_arena.alloc(field);
        data.class.0.fields.push(data);
        Ok(RefId(data))
    }

    /// Add a method to the class graph and to its class
    pub fn add_method(&self, method: MethodData<'g>) -> Result<MethodId<'g>, Error> {
        if method
            .class
            .lookup_method(&method.name, &method.descriptor)
            .is_some()
        {
            return Err(Error::DuplicateMember(format!("{:?}", method)));
        }
        let data: &'g MethodData<'g> = &*self.arenas.method_arena.alloc(method);
        data.class.0.methods.push(data);
        Ok(RefId(data))
    }

    /// Add the standard library classes the synthesized code depends on
    pub fn insert_java_library(&self) -> Result<JavaLibrary<'g>, Error> {
        JavaLibrary::add_to_graph(self)
    }
}

pub struct ClassData<'g> {
    /// Name of the class
    pub name: BinaryName,

    /// Superclass is only ever missing for `java/lang/Object` itself
    pub superclass: Option<ClassId<'g>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<&'g ClassData<'g>>,

    pub access_flags: ClassAccessFlags,

    pub methods: FrozenVec<&'g MethodData<'g>>,

    pub fields: FrozenVec<&'g FieldData<'g>>,
}

impl<'g> ClassData<'g> {
    pub fn new(
        name: BinaryName,
        superclass: ClassId<'g>,
        access_flags: ClassAccessFlags,
    ) -> ClassData<'g> {
        ClassData {
            name,
            superclass: Some(superclass),
            interfaces: FrozenVec::new(),
            access_flags,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::ABSTRACT)
    }
}

impl<'g> ClassId<'g> {
    /// Record that this class implements (or this interface extends) another interface
    pub fn add_interface(self, interface: ClassId<'g>) {
        if !self.0.interfaces.iter().any(|i| RefId(i) == interface) {
            self.0.interfaces.push(interface.0);
        }
    }

    pub fn interfaces(self) -> impl Iterator<Item = ClassId<'g>> {
        self.0.interfaces.iter().map(RefId)
    }

    pub fn methods(self) -> impl Iterator<Item = MethodId<'g>> {
        self.0.methods.iter().map(RefId)
    }

    pub fn fields(self) -> impl Iterator<Item = FieldId<'g>> {
        self.0.fields.iter().map(RefId)
    }

    /// Method declared directly on this class
    pub fn lookup_method(
        self,
        name: &UnqualifiedName,
        descriptor: &MethodDescriptor<ClassId<'g>>,
    ) -> Option<MethodId<'g>> {
        self.methods()
            .find(|method| &method.name == name && &method.descriptor == descriptor)
    }

    /// Field declared directly on this class
    pub fn lookup_field(self, name: &UnqualifiedName) -> Option<FieldId<'g>> {
        self.fields().find(|field| &field.name == name)
    }

    /// The `<init>()V` constructor, if the class declares one
    pub fn default_constructor(self) -> Option<MethodId<'g>> {
        self.lookup_method(&UnqualifiedName::INIT, &MethodDescriptor::VOID)
    }

    /// The `<clinit>()V` static initializer, if the class declares one
    pub fn static_initializer(self) -> Option<MethodId<'g>> {
        self.lookup_method(&UnqualifiedName::CLINIT, &MethodDescriptor::VOID)
            .filter(|method| method.is_static())
    }
}

impl<'g> PartialEq for ClassData<'g> {
    fn eq(&self, other: &ClassData<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for ClassData<'g> {}

impl<'g> RenderDescriptor for ClassData<'g> {
    fn render_to(&self, write_to: &mut String) {
        self.name.render_to(write_to)
    }
}

impl<'g> Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

pub struct MethodData<'g> {
    pub class: ClassId<'g>,

    pub name: UnqualifiedName,

    pub descriptor: MethodDescriptor<ClassId<'g>>,

    pub access_flags: MethodAccessFlags,

    /// Code, once some has been attached
    body: OnceCell<Body<'g>>,
}

impl<'g> MethodData<'g> {
    pub fn new(
        class: ClassId<'g>,
        name: UnqualifiedName,
        descriptor: MethodDescriptor<ClassId<'g>>,
        access_flags: MethodAccessFlags,
    ) -> MethodData<'g> {
        MethodData {
            class,
            name,
            descriptor,
            access_flags,
            body: OnceCell::new(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == UnqualifiedName::INIT && !self.is_static()
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == UnqualifiedName::CLINIT && self.is_static()
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    /// Body attached to this method, if any
    pub fn body(&self) -> Option<&Body<'g>> {
        self.body.get()
    }
}

impl<'g> MethodId<'g> {
    /// Attach a body to the method
    ///
    /// A method gets at most one body: a second attempt is rejected and the first body is kept.
    pub fn attach_body(self, body: Body<'g>) -> Result<&'g Body<'g>, Error> {
        if self.0.body.set(body).is_err() {
            return Err(Error::BodyAlreadyAttached(format!("{:?}", self)));
        }
        self.0
            .body
            .get()
            .ok_or_else(|| Error::MissingMember(format!("body of {:?}", self)))
    }
}

impl<'g> Debug for MethodData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}.{}:{}",
            self.class.name.as_str(),
            self.name.as_str(),
            self.descriptor.render(),
        ))
    }
}

pub struct FieldData<'g> {
    pub class: ClassId<'g>,

    pub name: UnqualifiedName,

    pub descriptor: FieldType<ClassId<'g>>,

    pub access_flags: FieldAccessFlags,
}

impl<'g> FieldData<'g> {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(FieldAccessFlags::STATIC)
    }
}

impl<'g> Debug for FieldData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}.{}:{}",
            self.class.name.as_str(),
            self.name.as_str(),
            self.descriptor.render(),
        ))
    }
}
