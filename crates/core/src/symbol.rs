//! Interned symbols
//!
//! Words, refinements, and context keys all name things through `Symbol`.
//! Symbols are interned process-wide so comparison is an integer compare,
//! and every spelling is linked to a canon form (its case-folded spelling)
//! so word lookup and refinement matching are case-insensitive, while the
//! original spelling is preserved for molding.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex};

/// Handle to an interned spelling. Copy-cheap; identity-comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(u32);

struct SymbolTable {
    /// (spelling, canon id) per symbol id
    names: Vec<(String, u32)>,
    lookup: HashMap<String, u32>,
}

impl SymbolTable {
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let folded = name.to_lowercase();
        let canon = if folded == name {
            // This spelling IS the canon form; it canonizes to itself.
            self.names.len() as u32
        } else {
            self.intern(&folded)
        };
        let id = self.names.len() as u32;
        self.names.push((name.to_string(), canon));
        self.lookup.insert(name.to_string(), id);
        id
    }
}

static SYMBOLS: LazyLock<Mutex<SymbolTable>> = LazyLock::new(|| {
    Mutex::new(SymbolTable {
        names: Vec::new(),
        lookup: HashMap::new(),
    })
});

impl Symbol {
    /// Intern a spelling, returning its stable handle.
    pub fn intern(name: &str) -> Symbol {
        let mut table = SYMBOLS.lock().expect("symbol table poisoned");
        Symbol(table.intern(name))
    }

    /// The spelling this symbol was interned with.
    pub fn as_str(&self) -> String {
        let table = SYMBOLS.lock().expect("symbol table poisoned");
        table.names[self.0 as usize].0.clone()
    }

    /// The canon (case-folded) symbol for this spelling.
    pub fn canon(&self) -> Symbol {
        let table = SYMBOLS.lock().expect("symbol table poisoned");
        Symbol(table.names[self.0 as usize].1)
    }

    /// Case-insensitive equality: same canon form.
    pub fn eq_fold(&self, other: Symbol) -> bool {
        self == &other || self.canon() == other.canon()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
