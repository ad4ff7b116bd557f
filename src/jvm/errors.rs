use super::ir::SynLabel;

#[derive(Debug)]
pub enum Error {
    MissingClass(String),
    MissingMember(String),

    /// A class with the same binary name is already in the class graph
    DuplicateClass(String),

    /// A member with the same name and descriptor is already on the class
    DuplicateMember(String),

    MalformedName(String),
    MalformedDescriptor(std::io::Error),

    /// Bodies are attached at most once
    BodyAlreadyAttached(String),

    /// Local variable indices are 16 bits
    TooManyLocals(String),

    /// Error trying to verify
    VerifierError {
        index: usize,
        statement: String,
        kind: VerifierErrorKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierErrorKind {
    /// A statement refers to a local that isn't declared in the body
    InvalidIndex,

    /// The operand has the wrong kind of type (eg. indexing into a non-array)
    InvalidType,

    /// Found type (first) is not assignable to expected type (second)
    IncompatibleTypes(String, String),

    /// Identity statements must form a prefix binding `this` then the parameters in order
    MisplacedIdentity,

    /// Not every parameter (or `this`) gets bound
    MissingIdentity,

    /// Read of a local with no assignment on some path reaching the read
    UnassignedLocal(String),

    /// Use of an object before its constructor has been invoked
    UninitializedObject(String),

    /// A constructor can return without delegating to a superclass constructor
    ThisNotInitialized,

    /// Invocation kind doesn't match the shape of the callee
    WrongDispatch(String),

    /// Wrong number of arguments to an invocation
    ArgumentCount(usize, usize),

    DuplicateLabel(SynLabel),
    UndeclaredLabel(SynLabel),

    /// Execution can run past the last statement
    FallOffEnd,

    /// No path from the entry reaches this statement
    UnreachableStatement,

    /// An exception table entry is malformed
    InvalidTrap(String),
}
