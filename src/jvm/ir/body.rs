use super::{
    Comparison, Constant, FieldRef, IdentityRef, InvokeExpr, Local, Rvalue, Stmt, SynLabel,
    SynLabelGenerator, Trap, Value,
};
use crate::jvm::class_graph::{ClassId, MethodId};
use crate::jvm::{Error, FieldType, Name, RefType};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Declared local variable
#[derive(Clone, Debug, PartialEq)]
pub struct LocalDecl<'g> {
    pub name: String,
    pub field_type: FieldType<ClassId<'g>>,
}

/// Statement-level code for one method
///
/// Locals are typed and live in `locals`. Statements execute in order, apart from `if` jumps to
/// the labels placed by `nop` statements.
#[derive(Clone, Debug)]
pub struct Body<'g> {
    pub method: MethodId<'g>,
    pub locals: Vec<LocalDecl<'g>>,
    pub statements: Vec<Stmt<'g>>,
    pub traps: Vec<Trap<'g>>,
}

impl<'g> Body<'g> {
    pub fn local(&self, local: Local) -> Option<&LocalDecl<'g>> {
        self.locals.get(local.0 as usize)
    }

    /// Render one statement the way it appears in the full listing
    pub fn render_statement(&self, statement: &Stmt<'g>) -> String {
        let mut rendered = String::new();
        // Writing into a `String` can't fail
        let _ = self.write_statement(&mut rendered, statement);
        rendered
    }

    fn local_name(&self, local: Local) -> String {
        match self.local(local) {
            Some(decl) => decl.name.clone(),
            None => format!("<undeclared {}>", local.0),
        }
    }

    fn value(&self, value: &Value) -> String {
        match value {
            Value::Local(local) => self.local_name(*local),
            Value::Constant(Constant::Int(i)) => i.to_string(),
            Value::Constant(Constant::Long(l)) => format!("{}L", l),
            Value::Constant(Constant::Float(f)) => format!("{:?}F", f),
            Value::Constant(Constant::Double(d)) => format!("{:?}", d),
            Value::Constant(Constant::Null) => String::from("null"),
        }
    }

    fn arguments(&self, arguments: &[Value]) -> String {
        arguments
            .iter()
            .map(|argument| self.value(argument))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn invoke(&self, invoke: &InvokeExpr<'g>) -> String {
        let arguments = self.arguments(&invoke.arguments);
        match invoke.receiver {
            Some(receiver) => format!(
                "{} {}.{}({})",
                invoke.kind.keyword(),
                self.local_name(receiver),
                method_signature(invoke.method),
                arguments
            ),
            None => format!(
                "{} {}({})",
                invoke.kind.keyword(),
                method_signature(invoke.method),
                arguments
            ),
        }
    }

    fn field(&self, field_ref: &FieldRef<'g>) -> String {
        let field = field_ref.field;
        let signature = format!(
            "<{}: {} {}>",
            field.class.name.to_java_name(),
            type_name(&field.descriptor),
            field.name.as_str()
        );
        match field_ref.base {
            Some(base) => format!("{}.{}", self.local_name(base), signature),
            None => signature,
        }
    }

    fn rvalue(&self, rvalue: &Rvalue<'g>) -> String {
        match rvalue {
            Rvalue::Use(value) => self.value(value),
            Rvalue::New(class) => format!("new {}", class.name.to_java_name()),
            Rvalue::NewArray {
                element_type,
                length,
            } => format!("newarray ({})[{}]", type_name(element_type), self.value(length)),
            Rvalue::Cast(ref_type, local) => format!(
                "({}) {}",
                type_name(&FieldType::Ref(*ref_type)),
                self.local_name(*local)
            ),
            Rvalue::Invoke(invoke) => self.invoke(invoke),
            Rvalue::Field(field_ref) => self.field(field_ref),
            Rvalue::ArrayElement { array, index } => {
                format!("{}[{}]", self.local_name(*array), self.value(index))
            }
        }
    }

    fn write_statement(&self, f: &mut impl fmt::Write, statement: &Stmt<'g>) -> fmt::Result {
        match statement {
            Stmt::Identity(local, IdentityRef::This(class)) => write!(
                f,
                "{} := @this: {}",
                self.local_name(*local),
                class.name.to_java_name()
            ),
            Stmt::Identity(local, IdentityRef::Parameter(index, field_type)) => write!(
                f,
                "{} := @parameter{}: {}",
                self.local_name(*local),
                index,
                type_name(field_type)
            ),
            Stmt::Assign(local, rvalue) => {
                write!(f, "{} = {}", self.local_name(*local), self.rvalue(rvalue))
            }
            Stmt::Invoke(invoke) => f.write_str(&self.invoke(invoke)),
            Stmt::FieldStore(field_ref, value) => {
                write!(f, "{} = {}", self.field(field_ref), self.value(value))
            }
            Stmt::ArrayStore {
                array,
                index,
                value,
            } => write!(
                f,
                "{}[{}] = {}",
                self.local_name(*array),
                self.value(index),
                self.value(value)
            ),
            Stmt::If(condition, target) => {
                let operator = match condition.comparison {
                    Comparison::Eq => "==",
                    Comparison::Ne => "!=",
                };
                write!(
                    f,
                    "if {} {} {} goto {}",
                    self.value(&condition.lhs),
                    operator,
                    self.value(&condition.rhs),
                    target
                )
            }
            Stmt::Nop(_) => f.write_str("nop"),
            Stmt::Throw(local) => write!(f, "throw {}", self.local_name(*local)),
            Stmt::Return(None) => f.write_str("return"),
            Stmt::Return(Some(value)) => write!(f, "return {}", self.value(value)),
        }
    }
}

impl<'g> fmt::Display for Body<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method;
        let mut modifiers = method.access_flags.keywords().join(" ");
        if !modifiers.is_empty() {
            modifiers.push(' ');
        }
        let parameters = method
            .descriptor
            .parameters
            .iter()
            .map(type_name)
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            f,
            "{}{} {}({})",
            modifiers,
            return_type_name(&method.descriptor.return_type),
            method.name.as_str(),
            parameters
        )?;
        writeln!(f, "{{")?;
        for decl in &self.locals {
            writeln!(f, "    {} {};", type_name(&decl.field_type), decl.name)?;
        }
        if !self.locals.is_empty() {
            writeln!(f)?;
        }
        for statement in &self.statements {
            if let Some(label) = statement.placed_label() {
                writeln!(f, "  {}:", label)?;
            }
            f.write_str("    ")?;
            self.write_statement(f, statement)?;
            writeln!(f, ";")?;
        }
        for trap in &self.traps {
            writeln!(
                f,
                "    catch {} from {} to {} with {};",
                trap.exception.name.to_java_name(),
                trap.begin,
                trap.end,
                trap.handler
            )?;
        }
        writeln!(f, "}}")
    }
}

/// Source spelling of a type (`java.lang.String[]`, `int`)
pub fn type_name(field_type: &FieldType<ClassId>) -> String {
    let (element, dimensions) = match field_type {
        FieldType::Base(base_type) => return base_type.keyword().to_owned(),
        FieldType::Ref(RefType::Object(class)) => return class.name.to_java_name(),
        FieldType::Ref(RefType::ObjectArray(arr)) => {
            (arr.element_type.name.to_java_name(), arr.additional_dimensions + 1)
        }
        FieldType::Ref(RefType::PrimitiveArray(arr)) => {
            (arr.element_type.keyword().to_owned(), arr.additional_dimensions + 1)
        }
    };
    format!("{}{}", element, "[]".repeat(dimensions))
}

fn return_type_name(return_type: &Option<FieldType<ClassId>>) -> String {
    match return_type {
        None => String::from("void"),
        Some(field_type) => type_name(field_type),
    }
}

/// `<pkg.Class: ret name(params)>`
fn method_signature(method: MethodId) -> String {
    let parameters = method
        .descriptor
        .parameters
        .iter()
        .map(type_name)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "<{}: {} {}({})>",
        method.class.name.to_java_name(),
        return_type_name(&method.descriptor.return_type),
        method.name.as_str(),
        parameters
    )
}

/// Incrementally builds a [`Body`]
///
/// Fresh locals get a type-based prefix and a counter (`r0`, `r1`, `i0`, `z0`, ...), so building
/// the same sequence twice produces the same names.
pub struct BodyBuilder<'g> {
    method: MethodId<'g>,
    locals: Vec<LocalDecl<'g>>,
    statements: Vec<Stmt<'g>>,
    traps: Vec<Trap<'g>>,
    labels: SynLabelGenerator,
    name_counters: HashMap<char, usize>,

    /// Names given to `named_local` by the caller
    explicit_names: HashSet<String>,
}

impl<'g> BodyBuilder<'g> {
    pub fn new(method: MethodId<'g>) -> BodyBuilder<'g> {
        BodyBuilder {
            method,
            locals: vec![],
            statements: vec![],
            traps: vec![],
            labels: SynLabelGenerator::new(),
            name_counters: HashMap::new(),
            explicit_names: HashSet::new(),
        }
    }

    pub fn method(&self) -> MethodId<'g> {
        self.method
    }

    /// Declare a local with an explicit name
    pub fn named_local(
        &mut self,
        name: impl Into<String>,
        field_type: FieldType<ClassId<'g>>,
    ) -> Result<Local, Error> {
        let name = name.into();
        self.explicit_names.insert(name.clone());
        self.declare_local(name, field_type)
    }

    /// Declare a local with a generated name
    ///
    /// Generated names never repeat, but may still clash with a name given to `named_local`.
    pub fn fresh_local(&mut self, field_type: FieldType<ClassId<'g>>) -> Result<Local, Error> {
        let prefix = local_prefix(&field_type);
        let name = loop {
            let counter = self.name_counters.entry(prefix).or_insert(0);
            let name = format!("{}{}", prefix, counter);
            *counter += 1;
            if !self.explicit_names.contains(&name) {
                break name;
            }
        };
        self.declare_local(name, field_type)
    }

    fn declare_local(
        &mut self,
        name: String,
        field_type: FieldType<ClassId<'g>>,
    ) -> Result<Local, Error> {
        let index = u16::try_from(self.locals.len())
            .map_err(|_| Error::TooManyLocals(format!("{:?}", self.method)))?;
        self.locals.push(LocalDecl { name, field_type });
        Ok(Local(index))
    }

    pub fn local_type(&self, local: Local) -> Option<FieldType<ClassId<'g>>> {
        self.locals
            .get(local.0 as usize)
            .map(|decl| decl.field_type)
    }

    pub fn fresh_label(&mut self) -> SynLabel {
        self.labels.fresh_label()
    }

    pub fn push(&mut self, statement: Stmt<'g>) {
        log::trace!("{:?}: {:?}", self.method, statement);
        self.statements.push(statement);
    }

    pub fn add_trap(&mut self, trap: Trap<'g>) {
        self.traps.push(trap);
    }

    pub fn statements(&self) -> &[Stmt<'g>] {
        &self.statements
    }

    pub fn result(self) -> Body<'g> {
        Body {
            method: self.method,
            locals: self.locals,
            statements: self.statements,
            traps: self.traps,
        }
    }
}

fn local_prefix(field_type: &FieldType<ClassId>) -> char {
    use crate::jvm::BaseType;
    match field_type {
        FieldType::Ref(_) => 'r',
        FieldType::Base(BaseType::Int) => 'i',
        FieldType::Base(BaseType::Boolean) => 'z',
        FieldType::Base(BaseType::Byte) => 'b',
        FieldType::Base(BaseType::Char) => 'c',
        FieldType::Base(BaseType::Short) => 's',
        FieldType::Base(BaseType::Long) => 'l',
        FieldType::Base(BaseType::Float) => 'f',
        FieldType::Base(BaseType::Double) => 'd',
    }
}
