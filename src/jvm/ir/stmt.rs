use super::SynLabel;
use crate::jvm::class_graph::{ClassId, FieldId, MethodId};
use crate::jvm::{BaseType, FieldType, RefType};

/// Index into the local declarations of a body
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Local(pub u16);

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Constant {
    /// Also used for `boolean`, `byte`, `char`, and `short`
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
}

impl Constant {
    /// Default value of a primitive type (`false` is `0`)
    pub fn zero(base_type: BaseType) -> Constant {
        match base_type {
            BaseType::Long => Constant::Long(0),
            BaseType::Float => Constant::Float(0.0),
            BaseType::Double => Constant::Double(0.0),
            BaseType::Int
            | BaseType::Boolean
            | BaseType::Byte
            | BaseType::Char
            | BaseType::Short => Constant::Int(0),
        }
    }
}

/// Operand of a statement
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Local(Local),
    Constant(Constant),
}

impl From<Local> for Value {
    fn from(local: Local) -> Value {
        Value::Local(local)
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Value {
        Value::Constant(constant)
    }
}

/// Dispatch kind of a call
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Static,
    Special,
    Virtual,
    Interface,
}

impl InvokeKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            InvokeKind::Static => "staticinvoke",
            InvokeKind::Special => "specialinvoke",
            InvokeKind::Virtual => "virtualinvoke",
            InvokeKind::Interface => "interfaceinvoke",
        }
    }

    /// Parse `static`, `special`, `virtual`, or `interface`
    pub fn from_name(name: &str) -> Option<InvokeKind> {
        match name {
            "static" => Some(InvokeKind::Static),
            "special" => Some(InvokeKind::Special),
            "virtual" => Some(InvokeKind::Virtual),
            "interface" => Some(InvokeKind::Interface),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvokeExpr<'g> {
    pub kind: InvokeKind,
    pub method: MethodId<'g>,

    /// Absent exactly for static calls
    pub receiver: Option<Local>,

    pub arguments: Vec<Value>,
}

/// Right hand side of an identity statement
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IdentityRef<'g> {
    This(ClassId<'g>),
    Parameter(usize, FieldType<ClassId<'g>>),
}

/// Field access; `base` is absent exactly for static fields
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldRef<'g> {
    pub field: FieldId<'g>,
    pub base: Option<Local>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rvalue<'g> {
    Use(Value),

    /// Allocation of an uninitialized object
    New(ClassId<'g>),

    NewArray {
        element_type: FieldType<ClassId<'g>>,
        length: Value,
    },

    Cast(RefType<ClassId<'g>>, Local),
    Invoke(InvokeExpr<'g>),
    Field(FieldRef<'g>),

    ArrayElement {
        array: Local,
        index: Value,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Condition {
    pub comparison: Comparison,
    pub lhs: Value,
    pub rhs: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt<'g> {
    /// Binds `this` or a parameter to a local
    Identity(Local, IdentityRef<'g>),

    Assign(Local, Rvalue<'g>),

    /// Call whose result (if any) is discarded
    Invoke(InvokeExpr<'g>),

    FieldStore(FieldRef<'g>, Value),

    ArrayStore {
        array: Local,
        index: Value,
        value: Value,
    },

    /// Conditional jump
    If(Condition, SynLabel),

    /// No-op that marks a label
    Nop(SynLabel),

    Throw(Local),
    Return(Option<Value>),
}

impl<'g> Stmt<'g> {
    /// Can control continue to the next statement?
    pub fn falls_through(&self) -> bool {
        !matches!(self, Stmt::Throw(_) | Stmt::Return(_))
    }

    /// Label jumped to, if this is a branch
    pub fn branch_target(&self) -> Option<SynLabel> {
        match self {
            Stmt::If(_, target) => Some(*target),
            _ => None,
        }
    }

    /// Label placed by this statement
    pub fn placed_label(&self) -> Option<SynLabel> {
        match self {
            Stmt::Nop(label) => Some(*label),
            _ => None,
        }
    }
}

/// Exception table entry: throws of `exception` between `begin` (inclusive) and `end`
/// (exclusive) transfer to `handler`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Trap<'g> {
    pub begin: SynLabel,
    pub end: SynLabel,
    pub handler: SynLabel,
    pub exception: ClassId<'g>,
}
