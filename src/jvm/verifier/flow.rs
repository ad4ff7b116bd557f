use super::Verifier;
use crate::jvm::ir::{
    FieldRef, IdentityRef, InvokeExpr, InvokeKind, Local, Rvalue, Stmt, SynLabel, Value,
};
use crate::jvm::{Error, UnqualifiedName, VerifierErrorKind};
use std::collections::HashMap;

/// Where an uninitialized object came from
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Origin {
    /// `this` inside a constructor
    This,

    /// Index of the statement allocating the object
    New(usize),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum LocalState {
    Unassigned,
    Uninitialized(Origin),
    Initialized,
}

/// Abstract state before a statement
#[derive(Clone, PartialEq, Eq, Debug)]
struct State {
    locals: Vec<LocalState>,

    /// Has the superclass constructor run? (trivially true outside constructors)
    this_initialized: bool,
}

impl State {
    /// Combine with the state along another path, returning whether anything changed
    ///
    /// Locals that disagree become unusable.
    fn merge(&mut self, other: &State) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.locals.iter_mut().zip(&other.locals) {
            if *mine != *theirs && *mine != LocalState::Unassigned {
                *mine = LocalState::Unassigned;
                changed = true;
            }
        }
        if self.this_initialized && !other.this_initialized {
            self.this_initialized = false;
            changed = true;
        }
        changed
    }
}

/// Forward fix-point over the statements
pub(super) fn check_flow<'g>(
    verifier: &Verifier<'_, 'g>,
    labels: &HashMap<SynLabel, usize>,
) -> Result<(), Error> {
    let body = verifier.body;
    let statements = &body.statements;
    let end = statements.len();
    if statements.is_empty() {
        return Err(verifier.error(end, VerifierErrorKind::FallOffEnd));
    }

    // Constructors must delegate before returning, except for `Object` itself
    let method = body.method;
    let needs_super_call = method.is_constructor() && method.class.superclass.is_some();

    // Exception table ranges, as statement indices
    let handlers: Vec<(usize, usize, usize)> = body
        .traps
        .iter()
        .map(|trap| (labels[&trap.begin], labels[&trap.end], labels[&trap.handler]))
        .collect();

    let mut states: Vec<Option<State>> = vec![None; end];
    states[0] = Some(State {
        locals: vec![LocalState::Unassigned; body.locals.len()],
        this_initialized: !needs_super_call,
    });
    let mut worklist = vec![0];

    while let Some(index) = worklist.pop() {
        let before = match &states[index] {
            Some(state) => state.clone(),
            None => continue,
        };
        let statement = &statements[index];
        let after = transfer(verifier, index, statement, before.clone(), needs_super_call)?;

        let mut successors: Vec<(usize, &State)> = vec![];
        if statement.falls_through() {
            if index + 1 == end {
                return Err(verifier.error(index, VerifierErrorKind::FallOffEnd));
            }
            successors.push((index + 1, &after));
        }
        if let Some(target) = statement.branch_target() {
            successors.push((labels[&target], &after));
        }
        for (from, to, handler) in &handlers {
            if (*from..*to).contains(&index) {
                successors.push((*handler, &before));
            }
        }

        for (successor, state) in successors {
            let changed = match &mut states[successor] {
                Some(existing) => existing.merge(state),
                slot => {
                    *slot = Some(state.clone());
                    true
                }
            };
            if changed {
                worklist.push(successor);
            }
        }
    }

    if let Some(unreachable) = states.iter().position(Option::is_none) {
        return Err(verifier.error(unreachable, VerifierErrorKind::UnreachableStatement));
    }
    Ok(())
}

/// Abstract effect of one statement
fn transfer<'g>(
    verifier: &Verifier<'_, 'g>,
    index: usize,
    statement: &Stmt<'g>,
    mut state: State,
    needs_super_call: bool,
) -> Result<State, Error> {
    let require = |state: &State, local: Local| -> Result<(), Error> {
        let name = verifier
            .body
            .local(local)
            .map(|decl| decl.name.clone())
            .unwrap_or_default();
        match state.locals.get(local.0 as usize) {
            Some(LocalState::Initialized) => Ok(()),
            Some(LocalState::Uninitialized(_)) => {
                Err(verifier.error(index, VerifierErrorKind::UninitializedObject(name)))
            }
            Some(LocalState::Unassigned) => {
                Err(verifier.error(index, VerifierErrorKind::UnassignedLocal(name)))
            }
            None => Err(verifier.error(index, VerifierErrorKind::InvalidIndex)),
        }
    };
    let require_value = |state: &State, value: &Value| -> Result<(), Error> {
        match value {
            Value::Local(local) => require(state, *local),
            Value::Constant(_) => Ok(()),
        }
    };
    let require_field = |state: &State, field_ref: &FieldRef<'g>| -> Result<(), Error> {
        match field_ref.base {
            Some(base) => require(state, base),
            None => Ok(()),
        }
    };
    let require_invoke = |state: &State, invoke: &InvokeExpr<'g>| -> Result<(), Error> {
        if let Some(receiver) = invoke.receiver {
            require(state, receiver)?;
        }
        invoke
            .arguments
            .iter()
            .try_for_each(|argument| require_value(state, argument))
    };

    match statement {
        Stmt::Identity(local, identity) => {
            let initialized = match identity {
                IdentityRef::This(_) if needs_super_call => {
                    LocalState::Uninitialized(Origin::This)
                }
                _ => LocalState::Initialized,
            };
            state.locals[local.0 as usize] = initialized;
        }

        Stmt::Assign(local, rvalue) => {
            let assigned = match rvalue {
                // Moving an uninitialized reference between locals is fine
                Rvalue::Use(Value::Local(source)) => {
                    let source_state = state.locals[source.0 as usize];
                    if source_state == LocalState::Unassigned {
                        require(&state, *source)?;
                    }
                    source_state
                }
                Rvalue::Use(Value::Constant(_)) => LocalState::Initialized,
                Rvalue::New(_) => LocalState::Uninitialized(Origin::New(index)),
                Rvalue::NewArray { length, .. } => {
                    require_value(&state, length)?;
                    LocalState::Initialized
                }
                Rvalue::Cast(_, source) => {
                    require(&state, *source)?;
                    LocalState::Initialized
                }
                Rvalue::Invoke(invoke) => {
                    require_invoke(&state, invoke)?;
                    LocalState::Initialized
                }
                Rvalue::Field(field_ref) => {
                    require_field(&state, field_ref)?;
                    LocalState::Initialized
                }
                Rvalue::ArrayElement { array, index } => {
                    require(&state, *array)?;
                    require_value(&state, index)?;
                    LocalState::Initialized
                }
            };
            state.locals[local.0 as usize] = assigned;
        }

        Stmt::Invoke(invoke)
            if invoke.kind == InvokeKind::Special && invoke.method.name == UnqualifiedName::INIT =>
        {
            initialize(verifier, index, invoke, &mut state)?;
        }

        Stmt::Invoke(invoke) => require_invoke(&state, invoke)?,

        Stmt::FieldStore(field_ref, value) => {
            require_field(&state, field_ref)?;
            require_value(&state, value)?;
        }

        Stmt::ArrayStore {
            array,
            index: element_index,
            value,
        } => {
            require(&state, *array)?;
            require_value(&state, element_index)?;
            require_value(&state, value)?;
        }

        Stmt::If(condition, _) => {
            require_value(&state, &condition.lhs)?;
            require_value(&state, &condition.rhs)?;
        }

        Stmt::Nop(_) => (),

        Stmt::Throw(local) => require(&state, *local)?,

        Stmt::Return(value) => {
            if !state.this_initialized {
                return Err(verifier.error(index, VerifierErrorKind::ThisNotInitialized));
            }
            if let Some(value) = value {
                require_value(&state, value)?;
            }
        }
    }

    Ok(state)
}

/// Constructor call: the receiver must be uninitialized, and afterwards every copy of it is
/// initialized
fn initialize<'g>(
    verifier: &Verifier<'_, 'g>,
    index: usize,
    invoke: &InvokeExpr<'g>,
    state: &mut State,
) -> Result<(), Error> {
    let wrong_dispatch = |reason: String| {
        verifier.error(index, VerifierErrorKind::WrongDispatch(reason))
    };

    for argument in &invoke.arguments {
        if let Value::Local(local) = argument {
            if state.locals.get(local.0 as usize) != Some(&LocalState::Initialized) {
                let name = verifier
                    .body
                    .local(*local)
                    .map(|decl| decl.name.clone())
                    .unwrap_or_default();
                return Err(verifier.error(index, VerifierErrorKind::UninitializedObject(name)));
            }
        }
    }

    let receiver = match invoke.receiver {
        Some(receiver) => receiver,
        None => return Err(wrong_dispatch(String::from("constructor call without receiver"))),
    };
    let origin = match state.locals.get(receiver.0 as usize) {
        Some(LocalState::Uninitialized(origin)) => *origin,
        Some(LocalState::Unassigned) | None => {
            let name = verifier
                .body
                .local(receiver)
                .map(|decl| decl.name.clone())
                .unwrap_or_default();
            return Err(verifier.error(index, VerifierErrorKind::UnassignedLocal(name)));
        }
        Some(LocalState::Initialized) => {
            return Err(wrong_dispatch(format!(
                "{:?} called on an initialized object",
                invoke.method
            )))
        }
    };

    // `this` delegates to its own class or its direct superclass, `new C` must run `C.<init>`
    let callee_class = invoke.method.class;
    let allowed = match origin {
        Origin::This => {
            let class = verifier.body.method.class;
            callee_class == class || class.superclass == Some(callee_class)
        }
        Origin::New(allocation) => match &verifier.body.statements[allocation] {
            Stmt::Assign(_, Rvalue::New(class)) => *class == callee_class,
            _ => false,
        },
    };
    if !allowed {
        return Err(wrong_dispatch(format!(
            "{:?} can't initialize this object",
            invoke.method
        )));
    }

    for local_state in state.locals.iter_mut() {
        if *local_state == LocalState::Uninitialized(origin) {
            *local_state = LocalState::Initialized;
        }
    }
    if origin == Origin::This {
        state.this_initialized = true;
    }
    Ok(())
}
