//! JSON description of a program: its classes and the summaries of its placeholder methods
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "lib/Bar", "methods": [{ "name": "baz", "descriptor": "()V" }] },
//!     {
//!       "name": "lib/Util",
//!       "methods": [{ "name": "foo", "descriptor": "(Ljava/lang/String;)I", "static": true }]
//!     }
//!   ],
//!   "summaries": [
//!     {
//!       "method": { "class": "lib/Util", "name": "foo", "descriptor": "(Ljava/lang/String;)I" },
//!       "invocations": [
//!         { "class": "lib/Bar", "name": "baz", "descriptor": "()V", "kind": "virtual" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Class names and descriptors use JVM internal syntax. Classes extend `java/lang/Object` unless
//! they say otherwise, and may be listed in any order. A listed class that is already in the class
//! graph (eg. `java/lang/String`) just gets the extra members.

use crate::jvm::class_graph::{ClassData, ClassGraph, FieldData, JavaLibrary, MethodData};
use crate::jvm::ir::InvokeKind;
use crate::jvm::{
    BinaryName, ClassAccessFlags, ClassId, FieldAccessFlags, FieldId, FieldType,
    MethodAccessFlags, MethodDescriptor, MethodId, Name, ParseDescriptor, UnqualifiedName,
};
use crate::synth::{BehaviorSummary, Error};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ProgramSpec {
    #[serde(default)]
    pub classes: Vec<ClassSpec>,

    #[serde(default)]
    pub summaries: Vec<SummarySpec>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClassSpec {
    pub name: String,

    /// Defaults to `java/lang/Object`
    #[serde(default)]
    pub superclass: Option<String>,

    #[serde(default)]
    pub interfaces: Vec<String>,

    #[serde(default)]
    pub interface: bool,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub methods: Vec<MethodSpec>,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MethodSpec {
    pub name: String,
    pub descriptor: String,

    #[serde(default, rename = "static")]
    pub is_static: bool,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub descriptor: String,

    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MethodRefSpec {
    pub class: String,
    pub name: String,
    pub descriptor: String,
}

/// Constructor of `class` with the given descriptor
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConstructorRefSpec {
    pub class: String,
    pub descriptor: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FieldRefSpec {
    pub class: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InvocationSpec {
    #[serde(flatten)]
    pub method: MethodRefSpec,

    /// One of `static`, `special`, `virtual`, or `interface`
    pub kind: String,

    #[serde(default)]
    pub result_used: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SummarySpec {
    /// Placeholder method the summary describes
    pub method: MethodRefSpec,

    #[serde(default)]
    pub object_creations: Vec<ConstructorRefSpec>,

    /// Element type descriptors (eg. `I` or `Ljava/lang/String;`)
    #[serde(default)]
    pub array_creations: Vec<String>,

    #[serde(default)]
    pub checked_exceptions: Vec<String>,

    #[serde(default)]
    pub invocations: Vec<InvocationSpec>,

    #[serde(default)]
    pub field_reads: Vec<FieldRefSpec>,

    #[serde(default)]
    pub field_writes: Vec<FieldRefSpec>,

    #[serde(default)]
    pub reads_array: bool,

    #[serde(default)]
    pub writes_array: bool,
}

impl ProgramSpec {
    pub fn from_json(source: &str) -> Result<ProgramSpec, Error> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<ProgramSpec, Error> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Add the classes to the class graph and resolve the summaries against it
    ///
    /// Summaries come back in the order they were listed.
    pub fn load_into<'g>(
        &self,
        class_graph: &'g ClassGraph<'g>,
        java: &JavaLibrary<'g>,
    ) -> Result<Vec<(MethodId<'g>, BehaviorSummary<'g>)>, Error> {
        let classes = self.declare_classes(class_graph, java)?;

        for (spec, class) in self.classes.iter().zip(&classes) {
            for interface in &spec.interfaces {
                class.add_interface(resolve_class(class_graph, interface)?);
            }
        }

        for (spec, class) in self.classes.iter().zip(&classes) {
            for method in &spec.methods {
                let mut access_flags = MethodAccessFlags::PUBLIC;
                if method.is_static {
                    access_flags |= MethodAccessFlags::STATIC;
                }
                if method.is_abstract {
                    access_flags |= MethodAccessFlags::ABSTRACT;
                }
                class_graph.add_method(MethodData::new(
                    *class,
                    make_name(&method.name)?,
                    resolve_method_descriptor(class_graph, &method.descriptor)?,
                    access_flags,
                ))?;
            }
            for field in &spec.fields {
                let mut access_flags = FieldAccessFlags::PUBLIC;
                if field.is_static {
                    access_flags |= FieldAccessFlags::STATIC;
                }
                class_graph.add_field(FieldData {
                    class: *class,
                    name: make_name(&field.name)?,
                    descriptor: resolve_field_type(class_graph, &field.descriptor)?,
                    access_flags,
                })?;
            }
        }
        log::debug!("Loaded {} classes", classes.len());

        self.summaries
            .iter()
            .map(|summary| summary.resolve(class_graph))
            .collect()
    }

    /// Add classes in an order where superclasses always come first
    fn declare_classes<'g>(
        &self,
        class_graph: &'g ClassGraph<'g>,
        java: &JavaLibrary<'g>,
    ) -> Result<Vec<ClassId<'g>>, Error> {
        let mut declared: Vec<Option<ClassId<'g>>> = vec![None; self.classes.len()];
        loop {
            let mut progress = false;
            for (spec, slot) in self.classes.iter().zip(declared.iter_mut()) {
                if slot.is_some() {
                    continue;
                }
                let name: BinaryName = make_name(&spec.name)?;
                if let Some(existing) = class_graph.lookup_class(&name) {
                    *slot = Some(existing);
                    progress = true;
                    continue;
                }
                let superclass = match &spec.superclass {
                    None => java.classes.lang.object,
                    Some(superclass) => match class_graph.lookup_class(&make_name(superclass)?) {
                        Some(superclass) => superclass,
                        None => continue,
                    },
                };
                let mut access_flags = ClassAccessFlags::PUBLIC;
                if spec.interface {
                    access_flags |= ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT;
                } else {
                    access_flags |= ClassAccessFlags::SUPER;
                }
                if spec.is_abstract {
                    access_flags |= ClassAccessFlags::ABSTRACT;
                }
                let data = ClassData::new(name, superclass, access_flags);
                *slot = Some(class_graph.add_class(data)?);
                progress = true;
            }

            if !progress {
                break;
            }
        }

        self.classes
            .iter()
            .zip(declared)
            .map(|(spec, class)| {
                class.ok_or_else(|| {
                    Error::MalformedSummary(format!(
                        "superclass {} of {} is unknown (or part of a cycle)",
                        spec.superclass.as_deref().unwrap_or_default(),
                        spec.name
                    ))
                })
            })
            .collect()
    }
}

impl SummarySpec {
    fn resolve<'g>(
        &self,
        class_graph: &'g ClassGraph<'g>,
    ) -> Result<(MethodId<'g>, BehaviorSummary<'g>), Error> {
        let method = self.method.resolve(class_graph)?;
        let mut summary = BehaviorSummary::new();

        for creation in &self.object_creations {
            let class = resolve_class(class_graph, &creation.class)?;
            let descriptor = resolve_method_descriptor(class_graph, &creation.descriptor)?;
            let constructor = class
                .lookup_method(&UnqualifiedName::INIT, &descriptor)
                .ok_or_else(|| {
                    Error::MalformedSummary(format!(
                        "{} has no constructor {}",
                        creation.class, creation.descriptor
                    ))
                })?;
            summary.add_object_creation(constructor);
        }
        for element_type in &self.array_creations {
            summary.add_array_creation(resolve_field_type(class_graph, element_type)?);
        }
        for exception in &self.checked_exceptions {
            summary.add_checked_exception(resolve_class(class_graph, exception)?);
        }
        for invocation in &self.invocations {
            let kind = InvokeKind::from_name(&invocation.kind).ok_or_else(|| {
                Error::MalformedSummary(format!("unknown dispatch kind '{}'", invocation.kind))
            })?;
            let callee = invocation.method.resolve(class_graph)?;
            summary.add_invocation(callee, kind, invocation.result_used);
        }
        for field in &self.field_reads {
            summary.add_field_read(field.resolve(class_graph)?);
        }
        for field in &self.field_writes {
            summary.add_field_write(field.resolve(class_graph)?);
        }
        summary.reads_array = self.reads_array;
        summary.writes_array = self.writes_array;

        Ok((method, summary))
    }
}

impl MethodRefSpec {
    fn resolve<'g>(&self, class_graph: &'g ClassGraph<'g>) -> Result<MethodId<'g>, Error> {
        let class = resolve_class(class_graph, &self.class)?;
        let name: UnqualifiedName = make_name(&self.name)?;
        let descriptor = resolve_method_descriptor(class_graph, &self.descriptor)?;
        class.lookup_method(&name, &descriptor).ok_or_else(|| {
            Error::MalformedSummary(format!(
                "unknown method {}.{}{}",
                self.class, self.name, self.descriptor
            ))
        })
    }
}

impl FieldRefSpec {
    fn resolve<'g>(&self, class_graph: &'g ClassGraph<'g>) -> Result<FieldId<'g>, Error> {
        let class = resolve_class(class_graph, &self.class)?;
        let name: UnqualifiedName = make_name(&self.name)?;
        class.lookup_field(&name).ok_or_else(|| {
            Error::MalformedSummary(format!("unknown field {}.{}", self.class, self.name))
        })
    }
}

fn make_name<N: Name>(name: &str) -> Result<N, Error> {
    N::from_str(name).map_err(Error::MalformedName)
}

fn resolve_class<'g>(class_graph: &'g ClassGraph<'g>, name: &str) -> Result<ClassId<'g>, Error> {
    let name: BinaryName = make_name(name)?;
    lookup_class(class_graph, &name)
}

fn lookup_class<'g>(
    class_graph: &'g ClassGraph<'g>,
    name: &BinaryName,
) -> Result<ClassId<'g>, Error> {
    class_graph
        .lookup_class(name)
        .ok_or_else(|| Error::MalformedSummary(format!("unknown class {}", name.as_str())))
}

fn resolve_method_descriptor<'g>(
    class_graph: &'g ClassGraph<'g>,
    descriptor: &str,
) -> Result<MethodDescriptor<ClassId<'g>>, Error> {
    MethodDescriptor::<BinaryName>::parse(descriptor)
        .map_err(|err| Error::MalformedSummary(format!("bad descriptor {}: {}", descriptor, err)))?
        .try_map(|name| lookup_class(class_graph, name))
}

fn resolve_field_type<'g>(
    class_graph: &'g ClassGraph<'g>,
    descriptor: &str,
) -> Result<FieldType<ClassId<'g>>, Error> {
    FieldType::<BinaryName>::parse(descriptor)
        .map_err(|err| Error::MalformedSummary(format!("bad descriptor {}: {}", descriptor, err)))?
        .try_map(|name| lookup_class(class_graph, name))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::ClassGraphArenas;

    #[test]
    fn classes_resolve_in_any_order() {
        let program = ProgramSpec::from_json(
            r#"{
              "classes": [
                { "name": "lib/Special", "superclass": "lib/Base",
                  "methods": [{ "name": "<init>", "descriptor": "()V" }] },
                { "name": "lib/Base", "interfaces": ["lib/Shape"], "abstract": true },
                { "name": "lib/Shape", "interface": true,
                  "methods": [{ "name": "area", "descriptor": "()D", "abstract": true }],
                  "fields": [{ "name": "UNIT", "descriptor": "Llib/Shape;", "static": true }] },
                { "name": "java/lang/String",
                  "methods": [{ "name": "length", "descriptor": "()I" }] }
              ],
              "summaries": [
                { "method": { "class": "lib/Special", "name": "<init>", "descriptor": "()V" },
                  "object_creations": [{ "class": "lib/Special", "descriptor": "()V" }],
                  "array_creations": ["[I", "Llib/Shape;"],
                  "checked_exceptions": ["java/lang/Exception"],
                  "invocations": [
                    { "class": "lib/Shape", "name": "area", "descriptor": "()D",
                      "kind": "interface", "result_used": true }
                  ],
                  "field_reads": [{ "class": "lib/Shape", "name": "UNIT" }],
                  "writes_array": true }
              ]
            }"#,
        )
        .unwrap();

        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let summaries = program.load_into(&class_graph, &java).unwrap();

        let base = class_graph
            .lookup_class(&BinaryName::from_str("lib/Base").unwrap())
            .unwrap();
        let shape = class_graph
            .lookup_class(&BinaryName::from_str("lib/Shape").unwrap())
            .unwrap();
        let special = class_graph
            .lookup_class(&BinaryName::from_str("lib/Special").unwrap())
            .unwrap();
        assert!(base.is_abstract());
        assert!(shape.is_interface());
        assert_eq!(special.superclass, Some(base));
        assert_eq!(base.interfaces().collect::<Vec<_>>(), vec![shape]);
        assert_eq!(java.classes.lang.string.methods().count(), 2);

        assert_eq!(summaries.len(), 1);
        let (method, summary) = &summaries[0];
        assert_eq!(method.class, special);
        assert!(method.is_constructor());
        assert_eq!(summary.object_creations().len(), 1);
        assert_eq!(
            summary.array_creations(),
            &[FieldType::array(FieldType::int()), FieldType::object(shape)]
        );
        assert_eq!(summary.checked_exceptions(), &[java.classes.lang.exception]);
        assert_eq!(summary.invocations()[0].kind, InvokeKind::Interface);
        assert!(summary.invocations()[0].result_used);
        assert_eq!(summary.field_reads().len(), 1);
        assert!(summary.writes_array);
        assert!(!summary.reads_array);
    }

    #[test]
    fn unresolvable_input_is_malformed() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();

        let unknown_kind = ProgramSpec::from_json(
            r#"{
              "classes": [{ "name": "lib/A", "methods": [{ "name": "run", "descriptor": "()V" }] }],
              "summaries": [{
                "method": { "class": "lib/A", "name": "run", "descriptor": "()V" },
                "invocations": [{ "class": "lib/A", "name": "run", "descriptor": "()V",
                                  "kind": "dynamic" }]
              }]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            unknown_kind.load_into(&class_graph, &java),
            Err(Error::MalformedSummary(msg)) if msg.contains("dynamic")
        ));

        let orphan = ProgramSpec::from_json(
            r#"{ "classes": [{ "name": "lib/B", "superclass": "lib/Missing" }] }"#,
        )
        .unwrap();
        assert!(matches!(
            orphan.load_into(&class_graph, &java),
            Err(Error::MalformedSummary(_))
        ));

        assert!(matches!(
            ProgramSpec::from_json(r#"{ "classes": [{ "superclass": 3 }] }"#),
            Err(Error::Json(_))
        ));
    }
}
