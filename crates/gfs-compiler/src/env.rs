//! Macro environment with scoped bindings.
//!
//! [`MacroEnv`] holds the static macros (`!half`), the functional macros
//! (`!mod(score)`), and a stack of argument scopes pushed while a
//! functional macro body is being expanded. Static and functional macros
//! live in separate namespaces, so `!x` and `!x(...)` may both exist.

use std::collections::{HashMap, HashSet};

use gfs_types::ast::MacroDef;
use gfs_types::gfs::Expression;

// ══════════════════════════════════════════════════════════════════════════════
// Scope
// ══════════════════════════════════════════════════════════════════════════════

/// Argument bindings of one functional macro expansion.
#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Expression>,
}

// ══════════════════════════════════════════════════════════════════════════════
// MacroEnv
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct MacroEnv {
    /// `scopes[0]` holds the top-level static macros.
    scopes: Vec<Scope>,
    functions: HashMap<String, MacroDef>,
    /// Static macros whose definition failed to compile. A later use is
    /// still reported as undefined, with a note pointing at the failed
    /// definition.
    poisoned: HashSet<String>,
}

impl MacroEnv {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            functions: HashMap::new(),
            poisoned: HashSet::new(),
        }
    }

    /// Define (or redefine) a top-level static macro.
    pub fn define_static(&mut self, name: &str, value: Expression) {
        self.poisoned.remove(name);
        self.scopes[0].bindings.insert(name.to_string(), value);
    }

    /// Record that `!name` failed to compile.
    pub fn poison(&mut self, name: &str) {
        self.scopes[0].bindings.remove(name);
        self.poisoned.insert(name.to_string());
    }

    pub fn is_poisoned(&self, name: &str) -> bool {
        self.poisoned.contains(name)
    }

    /// Define (or redefine) a functional macro.
    pub fn define_function(&mut self, def: MacroDef) {
        self.functions.insert(def.name.name.clone(), def);
    }

    /// Look up a static macro or bound argument, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Expression> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    pub fn function(&self, name: &str) -> Option<&MacroDef> {
        self.functions.get(name)
    }

    /// Push a scope binding a functional macro's arguments.
    pub fn push_scope(&mut self, bindings: impl IntoIterator<Item = (String, Expression)>) {
        self.scopes.push(Scope {
            bindings: bindings.into_iter().collect(),
        });
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the root scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of argument scopes currently pushed.
    pub fn expansion_depth(&self) -> usize {
        self.scopes.len() - 1
    }
}

impl Default for MacroEnv {
    fn default() -> Self {
        Self::new()
    }
}
