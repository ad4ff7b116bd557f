use crate::jvm::class_graph::ClassId;
use crate::jvm::{BinaryName, FieldType, RefType};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Subtyping relationship between types
pub trait Assignable {
    /// Is the first type assignable to the second?
    fn is_assignable(&self, super_type: &Self) -> bool;
}

/// Walks superclass edges (and superinterface edges when the target is an interface)
impl<'g> Assignable for ClassId<'g> {
    fn is_assignable(&self, super_type: &ClassId<'g>) -> bool {
        let follow_interfaces = super_type.is_interface();
        let mut pending: Vec<ClassId<'g>> = vec![*self];
        let mut seen: HashSet<ClassId<'g>> = HashSet::new();
        seen.insert(*self);

        while let Some(class) = pending.pop() {
            if class == *super_type {
                return true;
            }
            let parents = class
                .superclass
                .into_iter()
                .chain(class.interfaces().filter(|_| follow_interfaces));
            for parent in parents {
                if seen.insert(parent) {
                    pending.push(parent);
                }
            }
        }

        false
    }
}

/// This matches the semantics of the prolog predicate `isJavaAssignable(sub_type, super_type)` in
/// the JVM verifier specification.
impl<'g> Assignable for RefType<ClassId<'g>> {
    fn is_assignable(&self, super_type: &RefType<ClassId<'g>>) -> bool {
        match (self, super_type) {
            (RefType::Object(sub), RefType::Object(sup)) => sub.is_assignable(sup),

            // Every array is an `Object`, `Cloneable`, and `Serializable`
            (RefType::PrimitiveArray(_) | RefType::ObjectArray(_), RefType::Object(sup)) => {
                is_array_supertype(&sup.name)
            }

            (RefType::PrimitiveArray(arr1), RefType::PrimitiveArray(arr2)) => arr1 == arr2,

            // `int[][]` is an `Object[]`, but `int[]` is not
            (RefType::PrimitiveArray(arr1), RefType::ObjectArray(arr2)) => {
                arr1.additional_dimensions > arr2.additional_dimensions
                    && is_array_supertype(&arr2.element_type.name)
            }

            // Arrays are covariant
            (RefType::ObjectArray(arr1), RefType::ObjectArray(arr2)) => {
                match arr1.additional_dimensions.cmp(&arr2.additional_dimensions) {
                    Ordering::Less => false,
                    Ordering::Equal => arr1.element_type.is_assignable(&arr2.element_type),
                    Ordering::Greater => is_array_supertype(&arr2.element_type.name),
                }
            }

            _ => false,
        }
    }
}

/// Primitive types must match exactly
impl<'g> Assignable for FieldType<ClassId<'g>> {
    fn is_assignable(&self, super_type: &FieldType<ClassId<'g>>) -> bool {
        match (self, super_type) {
            (FieldType::Base(base1), FieldType::Base(base2)) => base1 == base2,
            (FieldType::Ref(ref1), FieldType::Ref(ref2)) => ref1.is_assignable(ref2),
            _ => false,
        }
    }
}

fn is_array_supertype(super_type: &BinaryName) -> bool {
    super_type == &BinaryName::OBJECT
        || super_type == &BinaryName::CLONEABLE
        || super_type == &BinaryName::SERIALIZABLE
}

#[cfg(test)]
mod test {
    use crate::jvm::class_graph::{Assignable, ClassData, ClassGraph, ClassGraphArenas};
    use crate::jvm::{BinaryName, ClassAccessFlags, FieldType, Name, RefType};

    #[test]
    fn class_hierarchy() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let lang = &java.classes.lang;

        assert!(lang.object.is_assignable(&lang.object));
        assert!(lang.string.is_assignable(&lang.object));
        assert!(!lang.object.is_assignable(&lang.string));
        assert!(lang.runtime_exception.is_assignable(&lang.throwable));
        assert!(lang.error.is_assignable(&lang.throwable));
        assert!(!lang.error.is_assignable(&lang.exception));
        assert!(lang.exception.is_assignable(&java.classes.io.serializable));
        assert!(!lang.string.is_assignable(&lang.cloneable));

        let closeable = class_graph
            .add_class(ClassData::new(
                BinaryName::from_str("pkg/Closeable").unwrap(),
                lang.object,
                ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
            ))
            .unwrap();
        let stream = class_graph
            .add_class(ClassData::new(
                BinaryName::from_str("pkg/Stream").unwrap(),
                lang.object,
                ClassAccessFlags::PUBLIC,
            ))
            .unwrap();
        let file_stream = class_graph
            .add_class(ClassData::new(
                BinaryName::from_str("pkg/FileStream").unwrap(),
                stream,
                ClassAccessFlags::PUBLIC,
            ))
            .unwrap();
        stream.add_interface(closeable);

        assert!(file_stream.is_assignable(&closeable));
        assert!(stream.is_assignable(&closeable));
        assert!(!closeable.is_assignable(&stream));
        assert!(closeable.is_assignable(&lang.object));
    }

    #[test]
    fn array_types() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library().unwrap();
        let lang = &java.classes.lang;

        let object = RefType::Object(lang.object);
        let cloneable = RefType::Object(lang.cloneable);
        let strings = RefType::array(FieldType::object(lang.string));
        let objects = RefType::array(FieldType::object(lang.object));
        let ints = RefType::array(FieldType::int());
        let int_grid = RefType::array(FieldType::array(FieldType::int()));

        assert!(strings.is_assignable(&objects));
        assert!(!objects.is_assignable(&strings));
        assert!(ints.is_assignable(&object));
        assert!(ints.is_assignable(&cloneable));
        assert!(!ints.is_assignable(&objects));
        assert!(int_grid.is_assignable(&objects));
        assert!(!object.is_assignable(&ints));

        assert!(FieldType::<crate::jvm::ClassId>::int().is_assignable(&FieldType::int()));
        assert!(!FieldType::<crate::jvm::ClassId>::int().is_assignable(&FieldType::long()));
    }
}
