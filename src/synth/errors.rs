use crate::jvm;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The summary asks for something that can't be expressed (eg. a call whose dispatch kind
    /// doesn't fit the callee, or an exception without a default constructor)
    MalformedSummary(String),

    /// A synthesized body failed verification, so it was not attached
    VerifierRejection { method: String, error: jvm::Error },

    /// A class already occupies the guard class name but doesn't have its shape
    DuplicateGuardClass(String),

    MalformedName(String),

    /// Failure in the program model
    Program(jvm::Error),

    /// Reading program input
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<jvm::Error> for Error {
    fn from(err: jvm::Error) -> Error {
        Error::Program(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedSummary(msg) => write!(f, "malformed summary: {}", msg),
            Error::VerifierRejection { method, error } => {
                write!(f, "body synthesized for {} failed verification: {:?}", method, error)
            }
            Error::DuplicateGuardClass(msg) => write!(f, "guard class conflict: {}", msg),
            Error::MalformedName(msg) => write!(f, "malformed name: {}", msg),
            Error::Program(err) => write!(f, "program model error: {:?}", err),
            Error::Io(err) => write!(f, "i/o error: {}", err),
            Error::Json(err) => write!(f, "invalid program description: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}
