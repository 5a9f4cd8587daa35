use std::fmt;

/// A compiler-generated temporary, displayed as `t0`, `t1`, ...
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temp(usize);

impl Temp {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Advance internal counter to next temporary
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A jump target in the IR, displayed as `L0`, `L1`, ...
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(usize);

impl Label {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Advance internal counter to next label
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}
