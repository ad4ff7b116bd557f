//! Model of JVM classes and the statement-level code attached to their methods
//!
//! ### Simple example
//!
//! Declaring a class with a `static int reset()` method and giving it a verified body:
//!
//! ```
//! use jstub::jvm::class_graph::*;
//! use jstub::jvm::ir::*;
//! use jstub::jvm::*;
//!
//! # fn build() -> Result<(), Error> {
//! // Setup the class graph, add in Java standard library types
//! let arenas = ClassGraphArenas::new();
//! let class_graph = ClassGraph::new(&arenas);
//! let java = class_graph.insert_java_library()?;
//!
//! // Declare the class and its method
//! let class = class_graph.add_class(ClassData::new(
//!     BinaryName::from_string(String::from("me/Counter")).map_err(Error::MalformedName)?,
//!     java.classes.lang.object,
//!     ClassAccessFlags::PUBLIC,
//! ))?;
//! let reset = class_graph.add_method(MethodData::new(
//!     class,
//!     UnqualifiedName::from_string(String::from("reset")).map_err(Error::MalformedName)?,
//!     MethodDescriptor {
//!         parameters: vec![],
//!         return_type: Some(FieldType::int()),
//!     },
//!     MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
//! ))?;
//!
//! // Build, check, and attach the body
//! let mut code = BodyBuilder::new(reset);
//! code.push(Stmt::Return(Some(Value::Constant(Constant::Int(0)))));
//! let body = code.result();
//! verifier::verify(&body, &java)?;
//! reset.attach_body(body)?;
//! # Ok(())
//! # }
//! # build().unwrap();
//! ```

mod access_flags;
pub mod class_graph;
mod descriptors;
mod errors;
pub mod ir;
mod names;
pub mod verifier;

pub use access_flags::*;
pub use class_graph::{ClassId, FieldId, MethodId};
pub use descriptors::*;
pub use errors::*;
pub use names::*;
