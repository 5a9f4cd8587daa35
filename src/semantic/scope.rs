use std::collections::HashMap;
use std::fmt;

use crate::ast::Ident;
use crate::{Position, Span};

/// A declared variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: Ident,
    /// 0 is the global frame
    pub depth: usize,
    pub declared_at: Position,
    pub span: Span,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} depth {:<3} declared at {}",
            self.name, self.depth, self.declared_at
        )
    }
}

/// Stack of scope frames
///
/// The global frame is always present. Besides the live frames the table remembers every
/// symbol ever declared, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    global: HashMap<Ident, Symbol>,
    nested: Vec<HashMap<Ident, Symbol>>,
    declared: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth of the innermost frame
    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    pub fn push_frame(&mut self) {
        self.nested.push(HashMap::new());
    }

    /// Pop the innermost frame, the global frame stays
    pub fn pop_frame(&mut self) {
        self.nested.pop();
    }

    fn innermost(&self) -> &HashMap<Ident, Symbol> {
        self.nested.last().unwrap_or(&self.global)
    }

    fn innermost_mut(&mut self) -> &mut HashMap<Ident, Symbol> {
        match self.nested.last_mut() {
            Some(frame) => frame,
            None => &mut self.global,
        }
    }

    /// Declare `name` in the innermost frame
    ///
    /// Fails with the earlier symbol if the innermost frame already holds `name`.
    pub fn declare(&mut self, name: &str, span: Span) -> Result<&Symbol, &Symbol> {
        if self.innermost().contains_key(name) {
            return Err(&self.innermost()[name]);
        }

        let symbol = Symbol {
            name: name.to_string(),
            depth: self.depth(),
            declared_at: span.start,
            span,
        };
        self.declared.push(symbol.clone());
        Ok(self
            .innermost_mut()
            .entry(name.to_string())
            .or_insert(symbol))
    }

    /// Look `name` up, innermost frame first
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.nested
            .iter()
            .rev()
            .chain(std::iter::once(&self.global))
            .find_map(|frame| frame.get(name))
    }

    /// Every symbol declared so far
    pub fn symbols(&self) -> &[Symbol] {
        &self.declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_in_nested_frame() {
        let mut table = SymbolTable::new();
        table.declare("x", Span::default()).unwrap();
        table.push_frame();

        let inner = table.declare("x", Span::default()).unwrap();
        assert_eq!(inner.depth, 1);
        assert_eq!(table.resolve("x").unwrap().depth, 1);

        table.pop_frame();
        assert_eq!(table.resolve("x").unwrap().depth, 0);
        assert_eq!(table.symbols().len(), 2);
    }

    #[test]
    fn redeclaration_in_same_frame() {
        let mut table = SymbolTable::new();
        table.declare("x", Span::default()).unwrap();
        let previous = table.declare("x", Span::default()).unwrap_err();
        assert_eq!(previous.depth, 0);
        assert_eq!(table.symbols().len(), 1);
    }

    #[test]
    fn popped_frames_forget_their_names() {
        let mut table = SymbolTable::new();
        table.push_frame();
        table.declare("tmp", Span::default()).unwrap();
        table.pop_frame();
        assert!(table.resolve("tmp").is_none());
    }

    #[test]
    fn global_frame_stays() {
        let mut table = SymbolTable::new();
        table.pop_frame();
        assert_eq!(table.depth(), 0);
        assert!(table.declare("x", Span::default()).is_ok());
    }
}
