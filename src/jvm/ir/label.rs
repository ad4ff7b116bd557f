use std::fmt;

/// Branch target inside a body
#[derive(Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SynLabel(usize);

impl SynLabel {
    pub const FIRST: SynLabel = SynLabel(0);

    pub fn next(&self) -> SynLabel {
        SynLabel(self.0 + 1)
    }
}

/// Hands out labels that are unique within one body
#[derive(Clone)]
pub struct SynLabelGenerator(SynLabel);

impl SynLabelGenerator {
    pub fn new() -> SynLabelGenerator {
        SynLabelGenerator(SynLabel::FIRST)
    }

    pub fn fresh_label(&mut self) -> SynLabel {
        let label = self.0;
        self.0 = label.next();
        label
    }
}

impl Default for SynLabelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SynLabel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "label{}", self.0)
    }
}

impl fmt::Display for SynLabel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "label{}", self.0)
    }
}
