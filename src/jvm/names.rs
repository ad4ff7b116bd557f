use std::borrow::Cow;
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Names of methods, fields, and locals
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces, with `/` as the package separator
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct BinaryName(Cow<'static, str>);

pub trait Name: Sized {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extract the raw underlying string data
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extract the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;

    /// Try to construct a name from a borrowed string
    fn from_str(name: &str) -> Result<Self, String> {
        Self::from_string(name.to_owned())
    }
}

impl Name for UnqualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(String::from("Unqualified name is empty"))
        } else if name.contains(&['.', ';', '[', '/'][..]) {
            Err(format!(
                "Unqualified name '{}' contains an illegal character",
                name
            ))
        } else if name.contains(&['<', '>'][..])
            && name != UnqualifiedName::INIT.as_str()
            && name != UnqualifiedName::CLINIT.as_str()
        {
            Err(format!(
                "Only '<init>' and '<clinit>' may contain angle brackets, not '{}'",
                name
            ))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(UnqualifiedName(Cow::Owned(name)))
    }
}

impl Name for BinaryName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(String::from("Binary name is empty"));
        }
        for segment in name.split('/') {
            UnqualifiedName::check_valid(segment)
                .map_err(|msg| format!("Binary name '{}' is invalid: {}", name, msg))?;
            if segment.contains(&['<', '>'][..]) {
                return Err(format!("Binary name '{}' contains angle brackets", name));
            }
        }
        Ok(())
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(BinaryName(Cow::Owned(name)))
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl UnqualifiedName {
    const fn name(value: &'static str) -> UnqualifiedName {
        UnqualifiedName(Cow::Borrowed(value))
    }

    // JVM special methods
    pub const INIT: Self = Self::name("<init>");
    pub const CLINIT: Self = Self::name("<clinit>");

    // Synthesized code
    pub const GUARD: Self = Self::name("guard");
    pub const REGISTER: Self = Self::name("set_m");
}

impl BinaryName {
    const fn name(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    // JDK classes
    pub const OBJECT: Self = Self::name("java/lang/Object");
    pub const STRING: Self = Self::name("java/lang/String");
    pub const CLONEABLE: Self = Self::name("java/lang/Cloneable");
    pub const THROWABLE: Self = Self::name("java/lang/Throwable");
    pub const EXCEPTION: Self = Self::name("java/lang/Exception");
    pub const RUNTIMEEXCEPTION: Self = Self::name("java/lang/RuntimeException");
    pub const ERROR: Self = Self::name("java/lang/Error");
    pub const SERIALIZABLE: Self = Self::name("java/io/Serializable");

    // Synthetic classes
    pub const GUARD: Self = Self::name("jstub/Guard");

    /// Source-level spelling of the name (`java.lang.Object` for `java/lang/Object`)
    pub fn to_java_name(&self) -> String {
        self.0.replace('/', ".")
    }
}

#[cfg(test)]
mod test {
    use super::{BinaryName, Name, UnqualifiedName};

    #[test]
    fn unqualified_names() {
        assert!(UnqualifiedName::from_str("guard").is_ok());
        assert!(UnqualifiedName::from_str("<init>").is_ok());
        assert!(UnqualifiedName::from_str("<clinit>").is_ok());
        assert!(UnqualifiedName::from_str("").is_err());
        assert!(UnqualifiedName::from_str("a/b").is_err());
        assert!(UnqualifiedName::from_str("a;").is_err());
        assert!(UnqualifiedName::from_str("<other>").is_err());
    }

    #[test]
    fn binary_names() {
        assert!(BinaryName::from_str("java/lang/Object").is_ok());
        assert!(BinaryName::from_str("Top").is_ok());
        assert!(BinaryName::from_str("java//Object").is_err());
        assert!(BinaryName::from_str("java.lang.Object").is_err());
        assert!(BinaryName::from_str("pkg/<init>").is_err());
        assert_eq!(BinaryName::GUARD.to_java_name(), "jstub.Guard");
    }
}
