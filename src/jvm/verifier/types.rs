use crate::jvm::class_graph::{Assignable, ClassId};
use crate::jvm::ir::{type_name, Constant};
use crate::jvm::{BaseType, FieldType, RefType};

/// These types are from [this hierarchy][0], minus the uninitialized states (those are tracked
/// per local by the flow check instead)
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se7/html/jvms-4.html#jvms-4.10.1.2
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerificationType<'g> {
    Integer,
    Float,
    Double,
    Long,
    Null,
    Object(RefType<ClassId<'g>>),
}

impl<'g> VerificationType<'g> {
    pub fn is_reference(&self) -> bool {
        matches!(self, VerificationType::Null | VerificationType::Object(_))
    }

    /// Can a value of this type be stored somewhere declared with the given type?
    pub fn is_assignable_to(&self, expected: &FieldType<ClassId<'g>>) -> bool {
        match (self, expected) {
            (VerificationType::Null, FieldType::Ref(_)) => true,
            (VerificationType::Object(found), FieldType::Ref(expected)) => {
                found.is_assignable(expected)
            }
            (found, FieldType::Base(_)) => *found == VerificationType::from(*expected),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            VerificationType::Integer => String::from("int"),
            VerificationType::Float => String::from("float"),
            VerificationType::Double => String::from("double"),
            VerificationType::Long => String::from("long"),
            VerificationType::Null => String::from("null"),
            VerificationType::Object(ref_type) => type_name(&FieldType::Ref(*ref_type)),
        }
    }
}

impl<'g> From<FieldType<ClassId<'g>>> for VerificationType<'g> {
    fn from(field_type: FieldType<ClassId<'g>>) -> Self {
        match field_type {
            FieldType::Base(BaseType::Int)
            | FieldType::Base(BaseType::Char)
            | FieldType::Base(BaseType::Short)
            | FieldType::Base(BaseType::Byte)
            | FieldType::Base(BaseType::Boolean) => VerificationType::Integer,
            FieldType::Base(BaseType::Float) => VerificationType::Float,
            FieldType::Base(BaseType::Long) => VerificationType::Long,
            FieldType::Base(BaseType::Double) => VerificationType::Double,
            FieldType::Ref(ref_type) => VerificationType::Object(ref_type),
        }
    }
}

impl<'g> From<Constant> for VerificationType<'g> {
    fn from(constant: Constant) -> Self {
        match constant {
            Constant::Int(_) => VerificationType::Integer,
            Constant::Long(_) => VerificationType::Long,
            Constant::Float(_) => VerificationType::Float,
            Constant::Double(_) => VerificationType::Double,
            Constant::Null => VerificationType::Null,
        }
    }
}
