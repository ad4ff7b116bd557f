use bitflags::bitflags;

bitflags! {
    /// Access flags on a class or interface
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on a method
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// Access flags on a field
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const SYNTHETIC = 0x1000;
    }
}

impl MethodAccessFlags {
    /// Modifier keywords, in source order
    pub fn keywords(&self) -> Vec<&'static str> {
        let mut keywords = vec![];
        if self.contains(MethodAccessFlags::PUBLIC) {
            keywords.push("public");
        } else if self.contains(MethodAccessFlags::PROTECTED) {
            keywords.push("protected");
        } else if self.contains(MethodAccessFlags::PRIVATE) {
            keywords.push("private");
        }
        if self.contains(MethodAccessFlags::ABSTRACT) {
            keywords.push("abstract");
        }
        if self.contains(MethodAccessFlags::STATIC) {
            keywords.push("static");
        }
        if self.contains(MethodAccessFlags::FINAL) {
            keywords.push("final");
        }
        if self.contains(MethodAccessFlags::SYNCHRONIZED) {
            keywords.push("synchronized");
        }
        if self.contains(MethodAccessFlags::NATIVE) {
            keywords.push("native");
        }
        keywords
    }
}
