//! Body synthesis for placeholder methods
//!
//! A placeholder stands in for a library method whose real code is left out of the analysis. All
//! that is known about it is its signature and a [`BehaviorSummary`] of what it might do. The
//! synthesized body does all of those things, in a fixed order, while routing every reference
//! through a single `java/lang/Object` local (see [`AbstractionRegister`]):
//!
//!   1. _header_: bind `this` and the parameters (running the superclass constructor first in a
//!      constructor) and store the references
//!   2. _creations_: allocate objects, arrays, and the exceptions to be thrown
//!   3. _invocations_: make each call, storing reference results that are used
//!   4. _heap accesses_: read and write fields and array elements
//!   5. _exceptions_: throw each exception. Since only one throw can be the last statement, the
//!      others are skipped over by a branch on a flag of the shared [`GuardClass`], which nothing
//!      can prove is constant.
//!   6. _footer_: return, if nothing was thrown
//!
//! The result must pass [`crate::jvm::verifier::verify`] before it is handed out.

mod body;
mod bootstrap;
mod builders;
mod errors;
mod register;
mod settings;
mod summary;

pub use body::Phase;
pub use bootstrap::*;
pub use errors::*;
pub use register::*;
pub use settings::*;
pub use summary::*;

use crate::jvm::class_graph::{ClassGraph, JavaLibrary};
use crate::jvm::ir::Body;
use crate::jvm::MethodId;
use body::BodySynthesizer;
use std::cell::OnceCell;

/// Synthesizes bodies for the placeholder methods of one class graph
///
/// Methods are independent of each other and can be synthesized in any order. The only state
/// shared between them is the guard class, which is created the first time a body needs it.
pub struct Synthesizer<'g> {
    class_graph: &'g ClassGraph<'g>,
    java: JavaLibrary<'g>,
    settings: Settings,
    guard: OnceCell<GuardClass<'g>>,
}

impl<'g> Synthesizer<'g> {
    pub fn new(
        class_graph: &'g ClassGraph<'g>,
        java: JavaLibrary<'g>,
        settings: Settings,
    ) -> Synthesizer<'g> {
        Synthesizer {
            class_graph,
            java,
            settings,
            guard: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn java(&self) -> &JavaLibrary<'g> {
        &self.java
    }

    /// Guard class, if some body has needed it so far
    pub fn existing_guard_class(&self) -> Option<GuardClass<'g>> {
        self.guard.get().copied()
    }

    /// Get the guard class, creating it on first use
    pub fn guard_class(&self) -> Result<GuardClass<'g>, Error> {
        if let Some(guard) = self.guard.get() {
            return Ok(*guard);
        }
        let guard = ensure_guard_class_exists(self.class_graph, &self.java, &self.settings)?;
        Ok(*self.guard.get_or_init(|| guard))
    }

    /// Synthesize a verified body for a method, without attaching it
    pub fn synthesize(
        &self,
        method: MethodId<'g>,
        summary: &BehaviorSummary<'g>,
    ) -> Result<Body<'g>, Error> {
        BodySynthesizer::new(self, method, summary)?.synthesize()
    }

    /// Synthesize a verified body for a method and attach it
    ///
    /// Nothing is attached if synthesis fails.
    pub fn synthesize_and_attach(
        &self,
        method: MethodId<'g>,
        summary: &BehaviorSummary<'g>,
    ) -> Result<&'g Body<'g>, Error> {
        let body = self.synthesize(method, summary)?;
        let attached = method.attach_body(body)?;
        log::info!(
            "Attached body to {:?} ({} statements)",
            method,
            attached.statements.len()
        );
        Ok(attached)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::Error;
    use crate::jvm::class_graph::{ClassData, ClassGraphArenas, FieldData, MethodData};
    use crate::jvm::ir::{InvokeKind, Rvalue, Stmt};
    use crate::jvm::*;

    fn add_class<'g>(
        class_graph: &ClassGraph<'g>,
        name: &str,
        superclass: ClassId<'g>,
        access_flags: ClassAccessFlags,
    ) -> ClassId<'g> {
        class_graph
            .add_class(ClassData::new(
                BinaryName::from_str(name).unwrap(),
                superclass,
                access_flags,
            ))
            .unwrap()
    }

    fn add_method<'g>(
        class_graph: &'g ClassGraph<'g>,
        class: ClassId<'g>,
        name: &str,
        descriptor: &str,
        access_flags: MethodAccessFlags,
    ) -> MethodId<'g> {
        let descriptor = MethodDescriptor::<BinaryName>::parse(descriptor)
            .unwrap()
            .try_map(|name| class_graph.require_class(name))
            .unwrap();
        class_graph
            .add_method(MethodData::new(
                class,
                UnqualifiedName::from_str(name).unwrap(),
                descriptor,
                access_flags,
            ))
            .unwrap()
    }

    fn public_static() -> MethodAccessFlags {
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC
    }

    fn count<'g>(body: &Body<'g>, predicate: impl Fn(&Stmt<'g>) -> bool) -> usize {
        body.statements.iter().filter(|s| predicate(s)).count()
    }

    #[test]
    fn empty_summary_only_binds_and_returns() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let tick = add_method(&class_graph, util, "tick", "()V", public_static());
        let reset = add_method(&class_graph, util, "reset", "(JD)V", MethodAccessFlags::PUBLIC);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let summary = BehaviorSummary::new();
        assert!(summary.is_empty());

        let body = synthesizer.synthesize(tick, &summary).unwrap();
        assert_eq!(body.statements, vec![Stmt::Return(None)]);

        let body = synthesizer.synthesize(reset, &summary).unwrap();
        let expected = "\
public void reset(long, double)
{
    java.lang.Object set_m;
    lib.Util r0;
    long l0;
    double d0;

    r0 := @this: lib.Util;
    l0 := @parameter0: long;
    d0 := @parameter1: double;
    set_m = r0;
    return;
}
";
        assert_eq!(body.to_string(), expected);
        assert_eq!(synthesizer.existing_guard_class(), None);
    }

    #[test]
    fn static_method_calling_virtual_method() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let bar = add_class(&class_graph, "lib/Bar", object, ClassAccessFlags::PUBLIC);
        let foo = add_method(
            &class_graph,
            util,
            "foo",
            "(Ljava/lang/String;)I",
            public_static(),
        );
        let baz = add_method(&class_graph, bar, "baz", "()V", MethodAccessFlags::PUBLIC);

        let mut summary = BehaviorSummary::new();
        summary.add_invocation(baz, InvokeKind::Virtual, false);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(foo, &summary).unwrap();
        let expected = "\
public static int foo(java.lang.String)
{
    java.lang.Object set_m;
    java.lang.String r0;
    lib.Bar r1;

    r0 := @parameter0: java.lang.String;
    set_m = r0;
    r1 = (lib.Bar) set_m;
    virtualinvoke r1.<lib.Bar: void baz()>();
    return 0;
}
";
        assert_eq!(body.to_string(), expected);
    }

    #[test]
    fn constructor_writing_into_int_array() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let base = add_class(&class_graph, "lib/Base", object, ClassAccessFlags::PUBLIC);
        add_method(&class_graph, base, "<init>", "()V", MethodAccessFlags::PUBLIC);
        let buffer = add_class(&class_graph, "lib/Buffer", base, ClassAccessFlags::PUBLIC);
        let constructor =
            add_method(&class_graph, buffer, "<init>", "()V", MethodAccessFlags::PUBLIC);

        let mut summary = BehaviorSummary::new();
        summary.add_array_creation(FieldType::int());
        summary.writes_array = true;

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(constructor, &summary).unwrap();
        let expected = "\
public void <init>()
{
    java.lang.Object set_m;
    lib.Buffer r0;
    int[] r1;
    int[] r2;
    java.lang.Object[] r3;

    r0 := @this: lib.Buffer;
    specialinvoke r0.<lib.Base: void <init>()>();
    set_m = r0;
    r1 = newarray (int)[1];
    set_m = r1;
    r2 = (int[]) set_m;
    r2[0] = 0;
    r3 = (java.lang.Object[]) set_m;
    r3[0] = set_m;
    return;
}
";
        assert_eq!(body.to_string(), expected);
    }

    #[test]
    fn constructor_needs_default_superclass_constructor() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let base = add_class(&class_graph, "lib/Base", object, ClassAccessFlags::PUBLIC);
        add_method(&class_graph, base, "<init>", "(I)V", MethodAccessFlags::PUBLIC);
        let derived = add_class(&class_graph, "lib/Derived", base, ClassAccessFlags::PUBLIC);
        let constructor =
            add_method(&class_graph, derived, "<init>", "()V", MethodAccessFlags::PUBLIC);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        assert!(matches!(
            synthesizer.synthesize(constructor, &BehaviorSummary::new()),
            Err(Error::MalformedSummary(_))
        ));
    }

    #[test]
    fn single_exception_ends_in_unguarded_throw() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let open = add_method(&class_graph, util, "open", "()Ljava/lang/String;", public_static());

        let mut summary = BehaviorSummary::new();
        summary.add_checked_exception(java.classes.lang.exception);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(open, &summary).unwrap();

        assert!(matches!(body.statements.last(), Some(Stmt::Throw(_))));
        assert_eq!(count(&body, |s| matches!(s, Stmt::Throw(_))), 1);
        assert_eq!(count(&body, |s| matches!(s, Stmt::Return(_))), 0);
        assert_eq!(count(&body, |s| matches!(s, Stmt::If(_, _))), 0);
        assert_eq!(synthesizer.existing_guard_class(), None);
        assert!(class_graph.lookup_class(&BinaryName::GUARD).is_none());
    }

    #[test]
    fn multiple_exceptions_share_one_guard_read() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;
        let lang = java.classes.lang;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let io_failure = add_class(
            &class_graph,
            "lib/IOFailure",
            lang.exception,
            ClassAccessFlags::PUBLIC,
        );
        add_method(&class_graph, io_failure, "<init>", "()V", MethodAccessFlags::PUBLIC);
        let read = add_method(&class_graph, util, "read", "()I", public_static());

        let mut summary = BehaviorSummary::new();
        summary
            .add_checked_exception(io_failure)
            .add_checked_exception(lang.runtime_exception)
            .add_checked_exception(lang.error)
            .add_checked_exception(io_failure);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(read, &summary).unwrap();

        let guard = synthesizer.existing_guard_class().unwrap();
        assert_eq!(guard.class.name, BinaryName::GUARD);

        assert_eq!(count(&body, |s| matches!(s, Stmt::Throw(_))), 3);
        assert_eq!(count(&body, |s| matches!(s, Stmt::If(_, _))), 2);
        assert_eq!(count(&body, |s| matches!(s, Stmt::Nop(_))), 2);
        assert_eq!(count(&body, |s| matches!(s, Stmt::Return(_))), 0);
        let guard_reads = count(&body, |s| {
            matches!(s, Stmt::Assign(_, Rvalue::Field(field_ref)) if field_ref.field == guard.field)
        });
        assert_eq!(guard_reads, 1);
        assert!(matches!(body.statements.last(), Some(Stmt::Throw(_))));

        // Every guarded throw is skipped over by its own branch
        for (index, statement) in body.statements.iter().enumerate() {
            if let Stmt::If(_, target) = statement {
                assert!(matches!(body.statements[index + 2], Stmt::Throw(_)));
                assert_eq!(body.statements[index + 3], Stmt::Nop(*target));
            }
        }
    }

    #[test]
    fn guard_class_is_shared_between_methods() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;
        let lang = java.classes.lang;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let first = add_method(&class_graph, util, "first", "()V", public_static());
        let second = add_method(&class_graph, util, "second", "()V", public_static());

        let mut summary = BehaviorSummary::new();
        summary
            .add_checked_exception(lang.exception)
            .add_checked_exception(lang.error);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        synthesizer.synthesize_and_attach(first, &summary).unwrap();
        let guard = synthesizer.existing_guard_class().unwrap();
        synthesizer.synthesize_and_attach(second, &summary).unwrap();
        assert_eq!(synthesizer.existing_guard_class(), Some(guard));

        // A second synthesizer over the same graph picks up the existing class
        let other = Synthesizer::new(&class_graph, java, Settings::default());
        assert_eq!(other.guard_class().unwrap(), guard);

        let guard_classes = class_graph
            .classes()
            .filter(|class| class.name == BinaryName::GUARD)
            .count();
        assert_eq!(guard_classes, 1);
    }

    #[test]
    fn static_initializer_runs_once_per_creation() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let registry = add_class(&class_graph, "lib/Registry", object, ClassAccessFlags::PUBLIC);
        let plain = add_method(&class_graph, registry, "<init>", "()V", MethodAccessFlags::PUBLIC);
        let named = add_method(
            &class_graph,
            registry,
            "<init>",
            "(Ljava/lang/String;J)V",
            MethodAccessFlags::PUBLIC,
        );
        let clinit = add_method(
            &class_graph,
            registry,
            "<clinit>",
            "()V",
            MethodAccessFlags::STATIC,
        );
        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let make = add_method(&class_graph, util, "make", "()Ljava/lang/Object;", public_static());

        let mut summary = BehaviorSummary::new();
        summary
            .add_object_creation(plain)
            .add_object_creation(named)
            .add_object_creation(plain);
        assert_eq!(summary.object_creations().len(), 2);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(make, &summary).unwrap();

        let clinit_calls = count(&body, |s| match s {
            Stmt::Invoke(invoke) => invoke.method == clinit && invoke.kind == InvokeKind::Static,
            _ => false,
        });
        assert_eq!(clinit_calls, 2);

        let named_call = body
            .statements
            .iter()
            .find_map(|s| match s {
                Stmt::Invoke(invoke) if invoke.method == named => Some(invoke),
                _ => None,
            })
            .unwrap();
        let argument_types: Vec<String> = named_call
            .arguments
            .iter()
            .map(|argument| match argument {
                ir::Value::Local(local) => ir::type_name(&body.local(*local).unwrap().field_type),
                ir::Value::Constant(constant) => format!("{:?}", constant),
            })
            .collect();
        assert_eq!(argument_types, vec!["java.lang.String", "Long(0)"]);

        // The result comes straight out of the register
        assert_eq!(
            body.statements.last(),
            Some(&Stmt::Return(Some(ir::Value::Local(ir::Local(0)))))
        );
    }

    #[test]
    fn call_results_flow_into_register_when_used() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let source = add_class(
            &class_graph,
            "lib/Source",
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
        );
        let next = add_method(
            &class_graph,
            source,
            "next",
            "()Ljava/lang/String;",
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
        );
        let size = add_method(
            &class_graph,
            source,
            "size",
            "()I",
            MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
        );
        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let drain = add_method(&class_graph, util, "drain", "(Llib/Source;)V", public_static());

        let mut summary = BehaviorSummary::new();
        summary
            .add_invocation(next, InvokeKind::Interface, true)
            .add_invocation(size, InvokeKind::Interface, true);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(drain, &summary).unwrap();
        let listing = body.to_string();
        assert!(listing.contains("r2 = interfaceinvoke r1.<lib.Source: java.lang.String next()>();"));
        assert!(listing.contains("set_m = r2;"));
        assert!(listing.contains("    interfaceinvoke r3.<lib.Source: int size()>();"));

        // Abstract methods themselves never get bodies
        assert!(matches!(
            synthesizer.synthesize(next, &summary),
            Err(Error::MalformedSummary(_))
        ));
    }

    #[test]
    fn fields_are_read_into_and_written_from_register() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;
        let string = java.classes.lang.string;

        let node = add_class(&class_graph, "lib/Node", object, ClassAccessFlags::PUBLIC);
        let label = class_graph
            .add_field(FieldData {
                class: node,
                name: UnqualifiedName::from_str("label").unwrap(),
                descriptor: FieldType::object(string),
                access_flags: FieldAccessFlags::PUBLIC,
            })
            .unwrap();
        let count_field = class_graph
            .add_field(FieldData {
                class: node,
                name: UnqualifiedName::from_str("count").unwrap(),
                descriptor: FieldType::int(),
                access_flags: FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC,
            })
            .unwrap();
        let relabel = add_method(&class_graph, node, "relabel", "()V", MethodAccessFlags::PUBLIC);

        let mut summary = BehaviorSummary::new();
        summary
            .add_field_read(label)
            .add_field_read(count_field)
            .add_field_write(label)
            .add_field_write(count_field);

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(relabel, &summary).unwrap();
        let expected = "\
public void relabel()
{
    java.lang.Object set_m;
    lib.Node r0;
    lib.Node r1;
    java.lang.String r2;
    int i0;
    lib.Node r3;
    java.lang.String r4;

    r0 := @this: lib.Node;
    set_m = r0;
    r1 = (lib.Node) set_m;
    r2 = r1.<lib.Node: java.lang.String label>;
    set_m = r2;
    i0 = <lib.Node: int count>;
    r3 = (lib.Node) set_m;
    r4 = (java.lang.String) set_m;
    r3.<lib.Node: java.lang.String label> = r4;
    <lib.Node: int count> = 0;
    return;
}
";
        assert_eq!(body.to_string(), expected);
    }

    #[test]
    fn array_accesses_use_created_reference_type() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;
        let string = java.classes.lang.string;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let copy = add_method(&class_graph, util, "copy", "()V", public_static());
        let touch = add_method(&class_graph, util, "touch", "()V", public_static());

        let mut summary = BehaviorSummary::new();
        summary.add_array_creation(FieldType::object(string));
        summary.reads_array = true;
        summary.writes_array = true;

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(copy, &summary).unwrap();
        let listing = body.to_string();
        assert!(listing.contains("r0 = newarray (java.lang.String)[1];"));
        assert!(listing.contains("r1 = (java.lang.String[]) set_m;"));
        assert!(listing.contains("set_m = r1[0];"));
        assert!(listing.contains("r1[0] = r2;"));

        // Without any array creation, the register is treated as an `Object[]`
        let mut summary = BehaviorSummary::new();
        summary.reads_array = true;
        let body = synthesizer.synthesize(touch, &summary).unwrap();
        let expected = "\
public static void touch()
{
    java.lang.Object set_m;
    java.lang.Object[] r0;

    set_m = null;
    r0 = (java.lang.Object[]) set_m;
    set_m = r0[0];
    return;
}
";
        assert_eq!(body.to_string(), expected);
    }

    #[test]
    fn primitive_array_creation_keeps_references_flowing() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let get = add_method(
            &class_graph,
            util,
            "get",
            "([Ljava/lang/String;)Ljava/lang/String;",
            public_static(),
        );

        let mut summary = BehaviorSummary::new();
        summary
            .add_array_creation(FieldType::int())
            .add_array_creation(FieldType::object(java.classes.lang.string));
        summary.reads_array = true;
        summary.writes_array = true;

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let body = synthesizer.synthesize(get, &summary).unwrap();
        let expected = "\
public static java.lang.String get(java.lang.String[])
{
    java.lang.Object set_m;
    java.lang.String[] r0;
    int[] r1;
    java.lang.String[] r2;
    int[] r3;
    int i0;
    java.lang.String[] r4;
    java.lang.String r5;
    java.lang.String r6;

    r0 := @parameter0: java.lang.String[];
    set_m = r0;
    r1 = newarray (int)[1];
    set_m = r1;
    r2 = newarray (java.lang.String)[1];
    set_m = r2;
    r3 = (int[]) set_m;
    i0 = r3[0];
    r3[0] = 0;
    r4 = (java.lang.String[]) set_m;
    set_m = r4[0];
    r5 = (java.lang.String) set_m;
    r4[0] = r5;
    r6 = (java.lang.String) set_m;
    return r6;
}
";
        assert_eq!(body.to_string(), expected);

        // Elements of the incoming array reach the register
        let register = ir::Local(0);
        let element_reads = count(&body, |s| {
            matches!(s, Stmt::Assign(local, Rvalue::ArrayElement { .. }) if *local == register)
        });
        assert_eq!(element_reads, 1);
    }

    #[test]
    fn malformed_requests_are_rejected() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let run = add_method(&class_graph, util, "run", "()V", public_static());
        let helper = add_method(&class_graph, util, "helper", "()V", MethodAccessFlags::PUBLIC);
        let odd = add_class(
            &class_graph,
            "lib/OddFailure",
            java.classes.lang.exception,
            ClassAccessFlags::PUBLIC,
        );
        add_method(
            &class_graph,
            odd,
            "<init>",
            "(Ljava/lang/String;)V",
            MethodAccessFlags::PUBLIC,
        );

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());

        let mut not_throwable = BehaviorSummary::new();
        not_throwable.add_checked_exception(util);
        let mut no_default_constructor = BehaviorSummary::new();
        no_default_constructor.add_checked_exception(odd);
        let mut wrong_dispatch = BehaviorSummary::new();
        wrong_dispatch.add_invocation(helper, InvokeKind::Static, false);

        for summary in [not_throwable, no_default_constructor, wrong_dispatch] {
            assert!(matches!(
                synthesizer.synthesize_and_attach(run, &summary),
                Err(Error::MalformedSummary(_))
            ));
        }
        assert!(run.body().is_none());
    }

    #[test]
    fn synthesis_is_deterministic() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let object = java.classes.lang.object;
        let lang = java.classes.lang;

        let util = add_class(&class_graph, "lib/Util", object, ClassAccessFlags::PUBLIC);
        let work = add_method(
            &class_graph,
            util,
            "work",
            "(Ljava/lang/String;[I)Ljava/lang/String;",
            MethodAccessFlags::PUBLIC,
        );

        let mut summary = BehaviorSummary::new();
        summary
            .add_object_creation(java.members.string_init)
            .add_array_creation(FieldType::long())
            .add_checked_exception(lang.exception)
            .add_checked_exception(lang.error);
        summary.reads_array = true;

        let synthesizer = Synthesizer::new(&class_graph, java, Settings::default());
        let first = synthesizer.synthesize(work, &summary).unwrap();
        let second = synthesizer.synthesize(work, &summary).unwrap();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first.statements, second.statements);
    }
}
