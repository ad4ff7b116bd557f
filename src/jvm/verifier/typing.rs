use super::{VerificationType, Verifier};
use crate::jvm::class_graph::ClassId;
use crate::jvm::ir::{type_name, FieldRef, InvokeExpr, InvokeKind, Local, Rvalue, Stmt, Value};
use crate::jvm::{Error, FieldType, RefType, UnqualifiedName, VerifierErrorKind};

impl<'a, 'g> Verifier<'a, 'g> {
    pub(super) fn incompatible(
        &self,
        index: usize,
        found: VerificationType<'g>,
        expected: &FieldType<ClassId<'g>>,
    ) -> Error {
        let kind = VerifierErrorKind::IncompatibleTypes(found.describe(), type_name(expected));
        self.error(index, kind)
    }

    pub(super) fn local_type(
        &self,
        index: usize,
        local: Local,
    ) -> Result<FieldType<ClassId<'g>>, Error> {
        self.body
            .local(local)
            .map(|decl| decl.field_type)
            .ok_or_else(|| self.error(index, VerifierErrorKind::InvalidIndex))
    }

    fn value_type(&self, index: usize, value: &Value) -> Result<VerificationType<'g>, Error> {
        match value {
            Value::Local(local) => self.local_type(index, *local).map(VerificationType::from),
            Value::Constant(constant) => Ok(VerificationType::from(*constant)),
        }
    }

    fn expect_assignable(
        &self,
        index: usize,
        found: VerificationType<'g>,
        expected: &FieldType<ClassId<'g>>,
    ) -> Result<(), Error> {
        if found.is_assignable_to(expected) {
            Ok(())
        } else {
            Err(self.incompatible(index, found, expected))
        }
    }

    fn expect_int(&self, index: usize, value: &Value) -> Result<(), Error> {
        let found = self.value_type(index, value)?;
        self.expect_assignable(index, found, &FieldType::int())
    }

    /// Element type of an array-typed local
    fn array_element(
        &self,
        index: usize,
        array: Local,
    ) -> Result<FieldType<ClassId<'g>>, Error> {
        match self.local_type(index, array)? {
            FieldType::Ref(ref_type) => ref_type
                .array_element()
                .ok_or_else(|| self.error(index, VerifierErrorKind::InvalidType)),
            FieldType::Base(_) => Err(self.error(index, VerifierErrorKind::InvalidType)),
        }
    }

    /// Type check one statement against declared local types
    pub(super) fn check_statement(&self, index: usize, statement: &Stmt<'g>) -> Result<(), Error> {
        match statement {
            // Checked along with the rest of the structure
            Stmt::Identity(_, _) | Stmt::Nop(_) => Ok(()),

            Stmt::Assign(local, rvalue) => {
                let declared = self.local_type(index, *local)?;
                let found = self.rvalue_type(index, rvalue)?;
                self.expect_assignable(index, found, &declared)
            }

            Stmt::Invoke(invoke) => self.check_invoke(index, invoke),

            Stmt::FieldStore(field_ref, value) => {
                self.check_field(index, field_ref)?;
                let found = self.value_type(index, value)?;
                self.expect_assignable(index, found, &field_ref.field.descriptor)
            }

            Stmt::ArrayStore {
                array,
                index: element_index,
                value,
            } => {
                let element_type = self.array_element(index, *array)?;
                self.expect_int(index, element_index)?;
                let found = self.value_type(index, value)?;
                self.expect_assignable(index, found, &element_type)
            }

            Stmt::If(condition, _) => {
                let lhs = self.value_type(index, &condition.lhs)?;
                let rhs = self.value_type(index, &condition.rhs)?;
                let comparable = (lhs == VerificationType::Integer
                    && rhs == VerificationType::Integer)
                    || (lhs.is_reference() && rhs.is_reference());
                if comparable {
                    Ok(())
                } else {
                    let kind = VerifierErrorKind::IncompatibleTypes(lhs.describe(), rhs.describe());
                    Err(self.error(index, kind))
                }
            }

            Stmt::Throw(local) => {
                let found = self.local_type(index, *local)?;
                let throwable = FieldType::object(self.java.classes.lang.throwable);
                self.expect_assignable(index, VerificationType::from(found), &throwable)
            }

            Stmt::Return(value) => match (&self.body.method.descriptor.return_type, value) {
                (None, None) => Ok(()),
                (Some(return_type), Some(value)) => {
                    let found = self.value_type(index, value)?;
                    self.expect_assignable(index, found, return_type)
                }
                _ => Err(self.error(index, VerifierErrorKind::InvalidType)),
            },
        }
    }

    fn rvalue_type(
        &self,
        index: usize,
        rvalue: &Rvalue<'g>,
    ) -> Result<VerificationType<'g>, Error> {
        match rvalue {
            Rvalue::Use(value) => self.value_type(index, value),

            Rvalue::New(class) => {
                if class.is_interface() || class.is_abstract() {
                    return Err(self.error(index, VerifierErrorKind::InvalidType));
                }
                Ok(VerificationType::Object(RefType::Object(*class)))
            }

            Rvalue::NewArray {
                element_type,
                length,
            } => {
                self.expect_int(index, length)?;
                Ok(VerificationType::Object(RefType::array(*element_type)))
            }

            Rvalue::Cast(ref_type, local) => {
                if !self.local_type(index, *local)?.is_reference() {
                    return Err(self.error(index, VerifierErrorKind::InvalidType));
                }
                Ok(VerificationType::Object(*ref_type))
            }

            Rvalue::Invoke(invoke) => {
                self.check_invoke(index, invoke)?;
                match invoke.method.descriptor.return_type {
                    Some(return_type) => Ok(VerificationType::from(return_type)),
                    None => Err(self.error(index, VerifierErrorKind::InvalidType)),
                }
            }

            Rvalue::Field(field_ref) => {
                self.check_field(index, field_ref)?;
                Ok(VerificationType::from(field_ref.field.descriptor))
            }

            Rvalue::ArrayElement {
                array,
                index: element_index,
            } => {
                let element_type = self.array_element(index, *array)?;
                self.expect_int(index, element_index)?;
                Ok(VerificationType::from(element_type))
            }
        }
    }

    /// Dispatch kind, receiver, and arguments of a call
    fn check_invoke(&self, index: usize, invoke: &InvokeExpr<'g>) -> Result<(), Error> {
        let method = invoke.method;
        let wrong_dispatch = |reason: &str| {
            let msg = format!("{} {:?}: {}", invoke.kind.keyword(), method, reason);
            self.error(index, VerifierErrorKind::WrongDispatch(msg))
        };

        if method.name == UnqualifiedName::INIT && invoke.kind != InvokeKind::Special {
            return Err(wrong_dispatch("constructors are only invoked with specialinvoke"));
        }
        match invoke.kind {
            InvokeKind::Static if !method.is_static() => {
                return Err(wrong_dispatch("instance method"));
            }
            InvokeKind::Special | InvokeKind::Virtual | InvokeKind::Interface
                if method.is_static() =>
            {
                return Err(wrong_dispatch("static method"));
            }
            InvokeKind::Virtual if method.class.is_interface() => {
                return Err(wrong_dispatch("method is declared on an interface"));
            }
            InvokeKind::Interface if !method.class.is_interface() => {
                return Err(wrong_dispatch("method is declared on a class"));
            }
            _ => (),
        }
        if method.name == UnqualifiedName::CLINIT && invoke.kind != InvokeKind::Static {
            return Err(wrong_dispatch("static initializers take no receiver"));
        }

        match (invoke.kind, invoke.receiver) {
            (InvokeKind::Static, None) => (),
            (InvokeKind::Static, Some(_)) => {
                return Err(wrong_dispatch("static call with a receiver"));
            }
            (_, None) => return Err(wrong_dispatch("missing receiver")),
            (_, Some(receiver)) => {
                let found = VerificationType::from(self.local_type(index, receiver)?);
                self.expect_assignable(index, found, &FieldType::object(method.class))?;
            }
        }

        let parameters = &method.descriptor.parameters;
        if invoke.arguments.len() != parameters.len() {
            let kind = VerifierErrorKind::ArgumentCount(invoke.arguments.len(), parameters.len());
            return Err(self.error(index, kind));
        }
        for (argument, parameter) in invoke.arguments.iter().zip(parameters) {
            let found = self.value_type(index, argument)?;
            self.expect_assignable(index, found, parameter)?;
        }
        Ok(())
    }

    /// Static fields have no base, instance fields have a base of the right class
    fn check_field(&self, index: usize, field_ref: &FieldRef<'g>) -> Result<(), Error> {
        let field = field_ref.field;
        match (field.is_static(), field_ref.base) {
            (true, None) => Ok(()),
            (false, Some(base)) => {
                let found = VerificationType::from(self.local_type(index, base)?);
                self.expect_assignable(index, found, &FieldType::object(field.class))
            }
            _ => Err(self.error(index, VerifierErrorKind::InvalidType)),
        }
    }
}

