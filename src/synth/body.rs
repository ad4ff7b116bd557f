use super::builders;
use super::register::AbstractionRegister;
use super::summary::BehaviorSummary;
use super::{Error, Synthesizer};
use crate::jvm::class_graph::Assignable;
use crate::jvm::ir::{
    Body, BodyBuilder, Comparison, Condition, Constant, FieldRef, IdentityRef, InvokeExpr,
    InvokeKind, Local, Rvalue, Stmt, Value,
};
use crate::jvm::{verifier, ClassId, FieldId, FieldType, MethodId, RefType};

/// Progress through the synthesis of one body
///
/// Phases only ever advance, one step at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Start,
    HeaderEmitted,
    CreationsEmitted,
    InvocationsEmitted,
    ArraysEmitted,
    ExceptionsEmitted,
    FooterEmitted,
    Validated,
}

impl Phase {
    fn next(self) -> Option<Phase> {
        match self {
            Phase::Start => Some(Phase::HeaderEmitted),
            Phase::HeaderEmitted => Some(Phase::CreationsEmitted),
            Phase::CreationsEmitted => Some(Phase::InvocationsEmitted),
            Phase::InvocationsEmitted => Some(Phase::ArraysEmitted),
            Phase::ArraysEmitted => Some(Phase::ExceptionsEmitted),
            Phase::ExceptionsEmitted => Some(Phase::FooterEmitted),
            Phase::FooterEmitted => Some(Phase::Validated),
            Phase::Validated => None,
        }
    }
}

/// State for synthesizing the body of one method
pub(super) struct BodySynthesizer<'a, 'g> {
    synthesizer: &'a Synthesizer<'g>,
    summary: &'a BehaviorSummary<'g>,
    code: BodyBuilder<'g>,
    register: AbstractionRegister<'g>,

    /// `this`, for instance methods
    this: Option<Local>,

    /// Local holding the guard flag, once it has been read
    guard: Option<Local>,

    throw_sites: usize,
    phase: Phase,
}

impl<'a, 'g> BodySynthesizer<'a, 'g> {
    pub fn new(
        synthesizer: &'a Synthesizer<'g>,
        method: MethodId<'g>,
        summary: &'a BehaviorSummary<'g>,
    ) -> Result<BodySynthesizer<'a, 'g>, Error> {
        let mut code = BodyBuilder::new(method);
        let register = AbstractionRegister::declare(
            &mut code,
            synthesizer.java().classes.lang.object,
            &synthesizer.settings().register_name,
        )?;
        Ok(BodySynthesizer {
            synthesizer,
            summary,
            code,
            register,
            this: None,
            guard: None,
            throw_sites: 0,
            phase: Phase::Start,
        })
    }

    /// Run every phase, producing a verified body
    pub fn synthesize(mut self) -> Result<Body<'g>, Error> {
        let method = self.code.method();
        if method.is_abstract() || method.is_static_initializer() {
            return Err(Error::MalformedSummary(format!(
                "{:?} can't be given a placeholder body",
                method
            )));
        }

        self.emit_header()?;
        self.advance(Phase::HeaderEmitted);
        self.emit_creations()?;
        self.advance(Phase::CreationsEmitted);
        self.emit_invocations()?;
        self.advance(Phase::InvocationsEmitted);
        self.emit_heap_accesses()?;
        self.advance(Phase::ArraysEmitted);
        self.emit_exceptions()?;
        self.advance(Phase::ExceptionsEmitted);
        self.emit_footer()?;
        self.advance(Phase::FooterEmitted);

        let body = self.code.result();
        verifier::verify(&body, self.synthesizer.java()).map_err(|error| {
            Error::VerifierRejection {
                method: format!("{:?}", method),
                error,
            }
        })?;
        log::debug!("{:?}: {:?} -> {:?}", method, self.phase, Phase::Validated);
        Ok(body)
    }

    fn advance(&mut self, next: Phase) {
        debug_assert_eq!(self.phase.next(), Some(next));
        log::debug!("{:?}: {:?} -> {:?}", self.code.method(), self.phase, next);
        self.phase = next;
    }

    /// Bind `this` and the parameters, run the superclass constructor if this is a constructor,
    /// then put every incoming reference into the register
    fn emit_header(&mut self) -> Result<(), Error> {
        let method = self.code.method();
        let class = method.class;

        if !method.is_static() {
            let this = self.code.fresh_local(FieldType::object(class))?;
            self.code.push(Stmt::Identity(this, IdentityRef::This(class)));
            self.this = Some(this);
        }
        let mut parameters = vec![];
        for (index, parameter) in method.descriptor.parameters.iter().enumerate() {
            let local = self.code.fresh_local(*parameter)?;
            self.code
                .push(Stmt::Identity(local, IdentityRef::Parameter(index, *parameter)));
            parameters.push((local, *parameter));
        }

        if let (true, Some(this), Some(superclass)) =
            (method.is_constructor(), self.this, class.superclass)
        {
            let super_init = superclass.default_constructor().ok_or_else(|| {
                Error::MalformedSummary(format!(
                    "superclass {:?} of {:?} has no default constructor",
                    superclass, class
                ))
            })?;
            self.code.push(Stmt::Invoke(InvokeExpr {
                kind: InvokeKind::Special,
                method: super_init,
                receiver: Some(this),
                arguments: vec![],
            }));
        }

        if let Some(this) = self.this {
            self.register.store(&mut self.code, this);
        }
        for (local, parameter) in parameters {
            if parameter.is_reference() {
                self.register.store(&mut self.code, local);
            }
        }
        Ok(())
    }

    /// Objects, then arrays, then the exceptions that will be thrown
    fn emit_creations(&mut self) -> Result<(), Error> {
        let summary = self.summary;
        for creation in summary.object_creations() {
            let object =
                builders::create_object(&mut self.code, &mut self.register, creation.constructor)?;
            self.register.store(&mut self.code, object);
        }

        let length = self.synthesizer.settings().array_length;
        for element_type in summary.array_creations() {
            let array = builders::create_array(&mut self.code, *element_type, length)?;
            self.register.store(&mut self.code, array);
        }

        let throwable = self.synthesizer.java().classes.lang.throwable;
        for exception in summary.checked_exceptions() {
            if !exception.is_assignable(&throwable) {
                return Err(Error::MalformedSummary(format!(
                    "{:?} is not throwable",
                    exception
                )));
            }
            let constructor = exception.default_constructor().ok_or_else(|| {
                Error::MalformedSummary(format!("{:?} has no default constructor", exception))
            })?;
            let object = builders::create_object(&mut self.code, &mut self.register, constructor)?;
            self.register.store(&mut self.code, object);
        }
        Ok(())
    }

    fn emit_invocations(&mut self) -> Result<(), Error> {
        let summary = self.summary;
        for invocation in summary.invocations() {
            let invoke = builders::build_invoke(
                &mut self.code,
                &mut self.register,
                invocation.method,
                invocation.kind,
            )?;
            match invocation.method.descriptor.return_type {
                Some(FieldType::Ref(ref_type)) if invocation.result_used => {
                    let result = self.code.fresh_local(FieldType::Ref(ref_type))?;
                    self.code.push(Stmt::Assign(result, Rvalue::Invoke(invoke)));
                    self.register.store(&mut self.code, result);
                }
                Some(FieldType::Base(_)) if invocation.result_used => {
                    log::warn!(
                        "Dropping primitive result of {:?} (only references flow through the register)",
                        invocation.method
                    );
                    self.code.push(Stmt::Invoke(invoke));
                }
                _ => self.code.push(Stmt::Invoke(invoke)),
            }
        }
        Ok(())
    }

    /// Field reads and writes, then array element reads and writes
    fn emit_heap_accesses(&mut self) -> Result<(), Error> {
        let summary = self.summary;
        for field in summary.field_reads() {
            let base = self.field_base(*field)?;
            let value = self.code.fresh_local(field.descriptor)?;
            self.code.push(Stmt::Assign(
                value,
                Rvalue::Field(FieldRef {
                    field: *field,
                    base,
                }),
            ));
            if field.descriptor.is_reference() {
                self.register.store(&mut self.code, value);
            }
        }
        for field in summary.field_writes() {
            let base = self.field_base(*field)?;
            let value = self.register.load(&mut self.code, field.descriptor)?;
            self.code.push(Stmt::FieldStore(
                FieldRef {
                    field: *field,
                    base,
                },
                value,
            ));
        }

        if !summary.reads_array && !summary.writes_array {
            return Ok(());
        }

        // A created primitive array is viewed through its own type, then references always go
        // through a reference array view
        let created = summary.array_creations();
        let primitive = created.iter().copied().find(|element| !element.is_reference());
        let reference = created
            .iter()
            .copied()
            .find(|element| element.is_reference())
            .unwrap_or_else(|| FieldType::object(self.synthesizer.java().classes.lang.object));
        for element_type in primitive.into_iter().chain([reference]) {
            self.emit_array_access(element_type)?;
        }
        Ok(())
    }

    /// Read and/or write one element, viewing the register as an array of `element_type`
    fn emit_array_access(&mut self, element_type: FieldType<ClassId<'g>>) -> Result<(), Error> {
        let summary = self.summary;
        let index = Value::Constant(Constant::Int(self.synthesizer.settings().array_index));
        let array = self
            .register
            .load_ref(&mut self.code, RefType::array(element_type))?;

        if summary.reads_array {
            let read = Rvalue::ArrayElement { array, index };
            if element_type.is_reference() {
                self.register.assign(&mut self.code, read);
            } else {
                let element = self.code.fresh_local(element_type)?;
                self.code.push(Stmt::Assign(element, read));
            }
        }
        if summary.writes_array {
            let value = self.register.load(&mut self.code, element_type)?;
            self.code.push(Stmt::ArrayStore {
                array,
                index,
                value,
            });
        }
        Ok(())
    }

    fn field_base(&mut self, field: FieldId<'g>) -> Result<Option<Local>, Error> {
        if field.is_static() {
            Ok(None)
        } else {
            let base = self
                .register
                .load_ref(&mut self.code, RefType::Object(field.class))?;
            Ok(Some(base))
        }
    }

    /// One throw per exception, all but the last behind a branch on the guard flag
    fn emit_exceptions(&mut self) -> Result<(), Error> {
        let summary = self.summary;
        let exceptions = summary.checked_exceptions();
        for (position, exception) in exceptions.iter().enumerate() {
            if position + 1 == exceptions.len() {
                builders::build_throw(&mut self.code, &mut self.register, *exception)?;
            } else {
                let guard = self.guard_flag()?;
                let skip = self.code.fresh_label();
                self.code.push(Stmt::If(
                    Condition {
                        comparison: Comparison::Eq,
                        lhs: Value::Local(guard),
                        rhs: Value::Constant(Constant::Int(0)),
                    },
                    skip,
                ));
                builders::build_throw(&mut self.code, &mut self.register, *exception)?;
                self.code.push(Stmt::Nop(skip));
            }
            self.throw_sites += 1;
        }
        Ok(())
    }

    /// Read the guard flag (at most once per body)
    fn guard_flag(&mut self) -> Result<Local, Error> {
        if let Some(guard) = self.guard {
            return Ok(guard);
        }
        let guard_class = self.synthesizer.guard_class()?;
        let guard = self.code.fresh_local(FieldType::boolean())?;
        self.code.push(Stmt::Assign(
            guard,
            Rvalue::Field(FieldRef {
                field: guard_class.field,
                base: None,
            }),
        ));
        self.guard = Some(guard);
        Ok(guard)
    }

    /// Return, unless every path already ends in a throw
    fn emit_footer(&mut self) -> Result<(), Error> {
        if self.throw_sites == 0 {
            builders::build_return(&mut self.code, &mut self.register)?;
        }
        Ok(())
    }
}
