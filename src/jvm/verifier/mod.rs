//! Body verification
//!
//! A body is accepted only if the JVM would accept the bytecode it lowers to. The checks run in
//! three passes, each assuming the previous one succeeded:
//!
//!   1. _structure_: identity statements bind `this` and then every parameter, in order, before
//!      anything else; every label is placed exactly once and every jump target and exception
//!      table label is placed; exception table ranges are ordered and catch throwables
//!   2. _typing_: each statement is type-checked in isolation against the declared types of the
//!      locals it touches (dispatch kinds, receivers, argument counts, field staticness, array
//!      element types, and return types included)
//!   3. _flow_: a forward fix-point over the statements tracking, for every local, whether it is
//!      definitely assigned and whether it holds an object whose constructor has not yet run.
//!      This catches reads of unassigned locals, uses of uninitialized objects, constructors that
//!      never delegate to a superclass constructor, unreachable statements, and execution falling
//!      off the end of the body.
//!
//! This mirrors [verification by type-checking][0], except that locals have declared types so
//! only initialization state needs to flow.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.10.1

mod flow;
mod typing;
mod types;

pub use types::*;

use crate::jvm::class_graph::Assignable;
use crate::jvm::class_graph::JavaLibrary;
use crate::jvm::ir::{Body, IdentityRef, Stmt, SynLabel};
use crate::jvm::{Error, FieldType, RefType, VerifierErrorKind};
use std::collections::HashMap;

/// Check that a body would pass bytecode verification
pub fn verify<'g>(body: &Body<'g>, java: &JavaLibrary<'g>) -> Result<(), Error> {
    let verifier = Verifier { body, java };
    let labels = verifier.check_structure()?;
    for (index, statement) in body.statements.iter().enumerate() {
        verifier.check_statement(index, statement)?;
    }
    flow::check_flow(&verifier, &labels)?;
    log::debug!(
        "Verified {:?} ({} statements)",
        body.method,
        body.statements.len()
    );
    Ok(())
}

pub(crate) struct Verifier<'a, 'g> {
    pub body: &'a Body<'g>,
    pub java: &'a JavaLibrary<'g>,
}

impl<'a, 'g> Verifier<'a, 'g> {
    /// Build (and log) an error at a statement
    ///
    /// Errors about the body as a whole use the index one past the last statement.
    pub fn error(&self, index: usize, kind: VerifierErrorKind) -> Error {
        let statement = self
            .body
            .statements
            .get(index)
            .map(|statement| self.body.render_statement(statement))
            .unwrap_or_default();
        log::error!(
            "Verification of {:?} failed at {} `{}`: {:?}",
            self.body.method,
            index,
            statement,
            kind
        );
        Error::VerifierError {
            index,
            statement,
            kind,
        }
    }

    /// Identity prefix, label placement, and exception table sanity
    ///
    /// Returns the index of the statement placing each label.
    fn check_structure(&self) -> Result<HashMap<SynLabel, usize>, Error> {
        let method = self.body.method;
        let end = self.body.statements.len();

        let mut expected = vec![];
        if !method.is_static() {
            expected.push(IdentityRef::This(method.class));
        }
        for (index, parameter) in method.descriptor.parameters.iter().enumerate() {
            expected.push(IdentityRef::Parameter(index, *parameter));
        }

        let mut bound = 0;
        for (index, statement) in self.body.statements.iter().enumerate() {
            if let Stmt::Identity(local, identity) = statement {
                if index != bound || expected.get(bound) != Some(identity) {
                    return Err(self.error(index, VerifierErrorKind::MisplacedIdentity));
                }
                let bound_type = match identity {
                    IdentityRef::This(class) => FieldType::object(*class),
                    IdentityRef::Parameter(_, parameter) => *parameter,
                };
                let declared = self.local_type(index, *local)?;
                if !bound_type.is_assignable(&declared) {
                    return Err(self.incompatible(
                        index,
                        VerificationType::from(bound_type),
                        &declared,
                    ));
                }
                bound += 1;
            }
        }
        if bound != expected.len() {
            return Err(self.error(bound.min(end), VerifierErrorKind::MissingIdentity));
        }

        let mut labels = HashMap::new();
        for (index, statement) in self.body.statements.iter().enumerate() {
            if let Some(label) = statement.placed_label() {
                if labels.insert(label, index).is_some() {
                    return Err(self.error(index, VerifierErrorKind::DuplicateLabel(label)));
                }
            }
        }
        for (index, statement) in self.body.statements.iter().enumerate() {
            if let Some(target) = statement.branch_target() {
                if !labels.contains_key(&target) {
                    return Err(self.error(index, VerifierErrorKind::UndeclaredLabel(target)));
                }
            }
        }

        let throwable = RefType::Object(self.java.classes.lang.throwable);
        for trap in &self.body.traps {
            for label in [trap.begin, trap.end, trap.handler] {
                if !labels.contains_key(&label) {
                    return Err(self.error(end, VerifierErrorKind::UndeclaredLabel(label)));
                }
            }
            if labels[&trap.begin] >= labels[&trap.end] {
                let msg = format!("range {}..{} is empty", trap.begin, trap.end);
                return Err(self.error(end, VerifierErrorKind::InvalidTrap(msg)));
            }
            if !RefType::Object(trap.exception).is_assignable(&throwable) {
                let msg = format!("{:?} is not throwable", trap.exception);
                return Err(self.error(end, VerifierErrorKind::InvalidTrap(msg)));
            }
        }

        Ok(labels)
    }
}
