use super::Error;
use crate::jvm::{BinaryName, Name, UnqualifiedName};

pub struct Settings {
    /// Class holding the guard flag, written as `my/pkg/Guard`
    ///
    /// The class is created the first time a body needs to guard a throw. If a class with this
    /// name already exists, it must already have the guard shape.
    pub guard_class_name: BinaryName,

    /// Public static boolean field on the guard class
    ///
    /// Its static initializer sets it to `false`, but nothing can prove that it stays that way.
    pub guard_field_name: UnqualifiedName,

    /// Name of the `java/lang/Object` local that every synthesized body routes values through
    pub register_name: UnqualifiedName,

    /// Length of arrays allocated for array creation requests
    pub array_length: i32,

    /// Element index used for array reads and writes
    pub array_index: i32,
}

impl Settings {
    pub fn new(
        guard_class_name: impl Into<String>,
        guard_field_name: impl Into<String>,
    ) -> Result<Settings, Error> {
        fn make_name<N: Name>(name: impl Into<String>) -> Result<N, Error> {
            N::from_string(name.into()).map_err(Error::MalformedName)
        }

        Ok(Settings {
            guard_class_name: make_name(guard_class_name)?,
            guard_field_name: make_name(guard_field_name)?,
            register_name: make_name("set_m")?,
            array_length: 1,
            array_index: 0,
        })
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            guard_class_name: BinaryName::GUARD,
            guard_field_name: UnqualifiedName::GUARD,
            register_name: UnqualifiedName::REGISTER,
            array_length: 1,
            array_index: 0,
        }
    }
}
