use super::Error;
use crate::jvm::ir::{BodyBuilder, Constant, Local, Rvalue, Stmt, Value};
use crate::jvm::{ClassId, FieldType, Name, RefType, UnqualifiedName};

/// The single `java/lang/Object` local of a synthesized body
///
/// Every reference the body produces is stored here, and every reference the body consumes is
/// read back out through a cast to whatever type the use needs. Since all values end up in the
/// same place, any value can flow to any use, which is exactly the over-approximation the
/// analysis needs.
pub struct AbstractionRegister<'g> {
    local: Local,
    root: ClassId<'g>,

    /// Has anything been assigned yet?
    assigned: bool,
}

impl<'g> AbstractionRegister<'g> {
    /// Declare the register local (this emits no statements)
    pub fn declare(
        code: &mut BodyBuilder<'g>,
        root: ClassId<'g>,
        name: &UnqualifiedName,
    ) -> Result<AbstractionRegister<'g>, Error> {
        let local = code.named_local(name.as_str(), FieldType::object(root))?;
        Ok(AbstractionRegister {
            local,
            root,
            assigned: false,
        })
    }

    pub fn local(&self) -> Local {
        self.local
    }

    /// Widen a reference into the register
    pub fn store(&mut self, code: &mut BodyBuilder<'g>, value: Local) {
        self.assign(code, Rvalue::Use(Value::Local(value)));
    }

    /// Assign a reference-typed rvalue straight into the register
    pub fn assign(&mut self, code: &mut BodyBuilder<'g>, rvalue: Rvalue<'g>) {
        code.push(Stmt::Assign(self.local, rvalue));
        self.assigned = true;
    }

    /// Produce a value of the given type
    ///
    /// Primitives don't go through the register: they are just the zero of their type.
    pub fn load(
        &mut self,
        code: &mut BodyBuilder<'g>,
        field_type: FieldType<ClassId<'g>>,
    ) -> Result<Value, Error> {
        Ok(match field_type {
            FieldType::Base(base_type) => Value::Constant(Constant::zero(base_type)),
            FieldType::Ref(ref_type) => Value::Local(self.load_ref(code, ref_type)?),
        })
    }

    /// Narrow the register to a reference type
    ///
    /// Loading the root type reads the register directly, anything else goes through a cast into a
    /// fresh local.
    pub fn load_ref(
        &mut self,
        code: &mut BodyBuilder<'g>,
        ref_type: RefType<ClassId<'g>>,
    ) -> Result<Local, Error> {
        if !self.assigned {
            self.assign(code, Rvalue::Use(Value::Constant(Constant::Null)));
        }
        if ref_type == RefType::Object(self.root) {
            return Ok(self.local);
        }
        let narrowed = code.fresh_local(FieldType::Ref(ref_type))?;
        code.push(Stmt::Assign(narrowed, Rvalue::Cast(ref_type, self.local)));
        Ok(narrowed)
    }
}
