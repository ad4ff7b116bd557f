use crate::jvm::ir::InvokeKind;
use crate::jvm::{ClassId, FieldId, FieldType, MethodId};

/// Allocation of an object through a particular constructor
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObjectCreation<'g> {
    pub class: ClassId<'g>,
    pub constructor: MethodId<'g>,
}

/// Call made by the placeholder method
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Invocation<'g> {
    pub method: MethodId<'g>,
    pub kind: InvokeKind,

    /// Should the return value flow into the abstraction register?
    pub result_used: bool,
}

/// Everything a placeholder method may do, as far as the analysis is concerned
///
/// Each collection behaves like a set (re-adding an element is a no-op) but remembers insertion
/// order, which is also the order in which the synthesized body performs the operations.
#[derive(Clone, Debug, Default)]
pub struct BehaviorSummary<'g> {
    object_creations: Vec<ObjectCreation<'g>>,
    array_creations: Vec<FieldType<ClassId<'g>>>,
    checked_exceptions: Vec<ClassId<'g>>,
    invocations: Vec<Invocation<'g>>,
    field_reads: Vec<FieldId<'g>>,
    field_writes: Vec<FieldId<'g>>,

    /// Does the method read an element out of some array it can reach?
    pub reads_array: bool,

    /// Does the method write an element into some array it can reach?
    pub writes_array: bool,
}

fn insert_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

impl<'g> BehaviorSummary<'g> {
    pub fn new() -> BehaviorSummary<'g> {
        BehaviorSummary::default()
    }

    /// Object allocated with the given constructor
    pub fn add_object_creation(&mut self, constructor: MethodId<'g>) -> &mut Self {
        let creation = ObjectCreation {
            class: constructor.class,
            constructor,
        };
        insert_unique(&mut self.object_creations, creation);
        self
    }

    /// Array allocated with the given element type
    pub fn add_array_creation(&mut self, element_type: FieldType<ClassId<'g>>) -> &mut Self {
        insert_unique(&mut self.array_creations, element_type);
        self
    }

    pub fn add_checked_exception(&mut self, exception: ClassId<'g>) -> &mut Self {
        insert_unique(&mut self.checked_exceptions, exception);
        self
    }

    pub fn add_invocation(
        &mut self,
        method: MethodId<'g>,
        kind: InvokeKind,
        result_used: bool,
    ) -> &mut Self {
        let invocation = Invocation {
            method,
            kind,
            result_used,
        };
        insert_unique(&mut self.invocations, invocation);
        self
    }

    pub fn add_field_read(&mut self, field: FieldId<'g>) -> &mut Self {
        insert_unique(&mut self.field_reads, field);
        self
    }

    pub fn add_field_write(&mut self, field: FieldId<'g>) -> &mut Self {
        insert_unique(&mut self.field_writes, field);
        self
    }

    pub fn object_creations(&self) -> &[ObjectCreation<'g>] {
        &self.object_creations
    }

    pub fn array_creations(&self) -> &[FieldType<ClassId<'g>>] {
        &self.array_creations
    }

    pub fn checked_exceptions(&self) -> &[ClassId<'g>] {
        &self.checked_exceptions
    }

    pub fn invocations(&self) -> &[Invocation<'g>] {
        &self.invocations
    }

    pub fn field_reads(&self) -> &[FieldId<'g>] {
        &self.field_reads
    }

    pub fn field_writes(&self) -> &[FieldId<'g>] {
        &self.field_writes
    }

    /// Does the method do anything at all besides return?
    pub fn is_empty(&self) -> bool {
        self.object_creations.is_empty()
            && self.array_creations.is_empty()
            && self.checked_exceptions.is_empty()
            && self.invocations.is_empty()
            && self.field_reads.is_empty()
            && self.field_writes.is_empty()
            && !self.reads_array
            && !self.writes_array
    }
}
