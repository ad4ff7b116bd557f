use super::{BinaryName, Name};
use crate::util::RefId;
use std::io::{Error, ErrorKind, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Conversion of types into their JVM descriptor string
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

impl<'g, T: RenderDescriptor> RenderDescriptor for RefId<'g, T> {
    fn render_to(&self, write_to: &mut String) {
        self.0.render_to(write_to)
    }
}

/// Conversion of JVM descriptor strings into types
pub trait ParseDescriptor: Sized {
    /// Parse a descriptor, rejecting trailing input
    fn parse(source: &str) -> Result<Self> {
        let mut chars = source.chars().peekable();
        let ret = Self::parse_from(&mut chars)?;
        match chars.next() {
            None => Ok(ret),
            Some(c) => {
                let msg = format!("Unexpected leftover input '{}' in '{}'", c, source);
                Err(Error::new(ErrorKind::InvalidInput, msg))
            }
        }
    }

    /// Read the descriptor from a character buffer
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self>;
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    /// Keyword used for the type in source code
    pub fn keyword(&self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        let c = match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        };
        write_to.push(c);
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.next() {
            Some('B') => Ok(BaseType::Byte),
            Some('C') => Ok(BaseType::Char),
            Some('D') => Ok(BaseType::Double),
            Some('F') => Ok(BaseType::Float),
            Some('I') => Ok(BaseType::Int),
            Some('J') => Ok(BaseType::Long),
            Some('S') => Ok(BaseType::Short),
            Some('Z') => Ok(BaseType::Boolean),
            Some(c) => {
                let msg = format!("Invalid base type character '{}'", c);
                Err(Error::new(ErrorKind::InvalidInput, msg))
            }
            None => Err(Error::new(
                ErrorKind::UnexpectedEof,
                "Missing base type character",
            )),
        }
    }
}

/// Reference type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType<Class> {
    Object(Class),
    ObjectArray(ArrayType<Class>),
    PrimitiveArray(ArrayType<BaseType>),
}

/// Generic array type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType<T> {
    /// Additional dimensions (`A[]` has 0 additional dimensions, `A[][][][]` has 3)
    pub additional_dimensions: usize,

    /// Underlying element type (`A` is the underlying element type of `A[][]`)
    pub element_type: T,
}

impl<T> ArrayType<T> {
    pub fn try_map<T2, E>(
        &self,
        map_element: impl FnOnce(&T) -> std::result::Result<T2, E>,
    ) -> std::result::Result<ArrayType<T2>, E> {
        Ok(ArrayType {
            additional_dimensions: self.additional_dimensions,
            element_type: map_element(&self.element_type)?,
        })
    }
}

impl<T: RenderDescriptor> RenderDescriptor for ArrayType<T> {
    fn render_to(&self, write_to: &mut String) {
        for _ in 0..=self.additional_dimensions {
            write_to.push('[');
        }
        self.element_type.render_to(write_to);
    }
}

impl RenderDescriptor for BinaryName {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        write_to.push_str(self.as_str());
        write_to.push(';');
    }
}

impl ParseDescriptor for BinaryName {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        if source.next() != Some('L') {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Expected object type to start with `L`",
            ));
        }
        let mut class_name = String::new();
        loop {
            match source.next() {
                Some(';') => {
                    return BinaryName::from_string(class_name)
                        .map_err(|msg| Error::new(ErrorKind::InvalidInput, msg))
                }
                Some(c) => class_name.push(c),
                None => {
                    let msg = format!("Missing terminator for 'L{}'", class_name);
                    return Err(Error::new(ErrorKind::UnexpectedEof, msg));
                }
            }
        }
    }
}

impl<C: RenderDescriptor> RenderDescriptor for RefType<C> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            RefType::Object(cls) => cls.render_to(write_to),
            RefType::PrimitiveArray(arr) => arr.render_to(write_to),
            RefType::ObjectArray(arr) => arr.render_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for RefType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L') => Ok(RefType::Object(C::parse_from(source)?)),
            Some('[') => {
                let mut dimensions = 0;
                while source.next_if_eq(&'[').is_some() {
                    dimensions += 1;
                }
                let additional_dimensions = dimensions - 1;
                if let Some('L') = source.peek().copied() {
                    Ok(RefType::ObjectArray(ArrayType {
                        additional_dimensions,
                        element_type: C::parse_from(source)?,
                    }))
                } else {
                    Ok(RefType::PrimitiveArray(ArrayType {
                        additional_dimensions,
                        element_type: BaseType::parse_from(source)?,
                    }))
                }
            }
            Some(c) => {
                let msg = format!("Invalid reference type character '{}'", c);
                Err(Error::new(ErrorKind::InvalidInput, msg))
            }
            None => Err(Error::new(ErrorKind::UnexpectedEof, "Missing field type")),
        }
    }
}

impl<C> RefType<C> {
    /// Array whose elements have the given type
    pub fn array(field_type: FieldType<C>) -> RefType<C> {
        match field_type {
            FieldType::Base(element_type) => RefType::PrimitiveArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::Object(element_type)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::PrimitiveArray(arr)) => RefType::PrimitiveArray(ArrayType {
                additional_dimensions: arr.additional_dimensions + 1,
                element_type: arr.element_type,
            }),
            FieldType::Ref(RefType::ObjectArray(arr)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: arr.additional_dimensions + 1,
                element_type: arr.element_type,
            }),
        }
    }
}

impl<C: Clone> RefType<C> {
    /// Type of the elements, if this is an array type
    pub fn array_element(&self) -> Option<FieldType<C>> {
        match self {
            RefType::Object(_) => None,
            RefType::ObjectArray(arr) if arr.additional_dimensions == 0 => {
                Some(FieldType::object(arr.element_type.clone()))
            }
            RefType::PrimitiveArray(arr) if arr.additional_dimensions == 0 => {
                Some(FieldType::Base(arr.element_type))
            }
            RefType::ObjectArray(arr) => Some(FieldType::Ref(RefType::ObjectArray(ArrayType {
                additional_dimensions: arr.additional_dimensions - 1,
                element_type: arr.element_type.clone(),
            }))),
            RefType::PrimitiveArray(arr) => {
                Some(FieldType::Ref(RefType::PrimitiveArray(ArrayType {
                    additional_dimensions: arr.additional_dimensions - 1,
                    element_type: arr.element_type,
                })))
            }
        }
    }
}

impl<C> RefType<C> {
    pub fn try_map<C2, E>(
        &self,
        map_class: impl FnOnce(&C) -> std::result::Result<C2, E>,
    ) -> std::result::Result<RefType<C2>, E> {
        Ok(match self {
            RefType::Object(cls) => RefType::Object(map_class(cls)?),
            RefType::PrimitiveArray(arr) => RefType::PrimitiveArray(*arr),
            RefType::ObjectArray(arr) => RefType::ObjectArray(arr.try_map(map_class)?),
        })
    }
}

/// Type of a class, instance, or local variable
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType<Class> {
    Base(BaseType),
    Ref(RefType<Class>),
}

impl<C> FieldType<C> {
    pub const fn object(class: C) -> FieldType<C> {
        FieldType::Ref(RefType::Object(class))
    }

    pub const fn int() -> FieldType<C> {
        FieldType::Base(BaseType::Int)
    }

    pub const fn long() -> FieldType<C> {
        FieldType::Base(BaseType::Long)
    }

    pub const fn float() -> FieldType<C> {
        FieldType::Base(BaseType::Float)
    }

    pub const fn double() -> FieldType<C> {
        FieldType::Base(BaseType::Double)
    }

    pub const fn boolean() -> FieldType<C> {
        FieldType::Base(BaseType::Boolean)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Ref(_))
    }

    pub fn try_map<C2, E>(
        &self,
        map_class: impl FnOnce(&C) -> std::result::Result<C2, E>,
    ) -> std::result::Result<FieldType<C2>, E> {
        Ok(match self {
            FieldType::Base(base_type) => FieldType::Base(*base_type),
            FieldType::Ref(ref_type) => FieldType::Ref(ref_type.try_map(map_class)?),
        })
    }
}

impl<C> FieldType<C> {
    pub fn array(field_type: FieldType<C>) -> FieldType<C> {
        FieldType::Ref(RefType::array(field_type))
    }
}

impl<C: RenderDescriptor> RenderDescriptor for FieldType<C> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(write_to),
            FieldType::Ref(reference_type) => reference_type.render_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for FieldType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L' | '[') => RefType::parse_from(source).map(FieldType::Ref),
            Some(_) => BaseType::parse_from(source).map(FieldType::Base),
            None => Err(Error::new(ErrorKind::UnexpectedEof, "Missing field type")),
        }
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor<Class> {
    pub parameters: Vec<FieldType<Class>>,

    /// `None` is for `void`
    pub return_type: Option<FieldType<Class>>,
}

impl<C> MethodDescriptor<C> {
    /// Descriptor for `()V`
    pub const VOID: MethodDescriptor<C> = MethodDescriptor {
        parameters: vec![],
        return_type: None,
    };

    pub fn try_map<C2, E>(
        &self,
        mut map_class: impl FnMut(&C) -> std::result::Result<C2, E>,
    ) -> std::result::Result<MethodDescriptor<C2>, E> {
        let parameters = self
            .parameters
            .iter()
            .map(|parameter| parameter.try_map(&mut map_class))
            .collect::<std::result::Result<Vec<_>, E>>()?;
        let return_type = match &self.return_type {
            None => None,
            Some(return_type) => Some(return_type.try_map(&mut map_class)?),
        };
        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

impl<C: RenderDescriptor> RenderDescriptor for MethodDescriptor<C> {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.render_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for MethodDescriptor<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        if source.next() != Some('(') {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Expected method descriptor to start with `(`",
            ));
        }
        let mut parameters = vec![];
        while source.next_if_eq(&')').is_none() {
            parameters.push(FieldType::parse_from(source)?);
        }
        let return_type = if source.next_if_eq(&'V').is_some() {
            None
        } else {
            Some(FieldType::parse_from(source)?)
        };
        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}
