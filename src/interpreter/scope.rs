//! Variable Scopes
//!
//! Variables live in a chain of scopes. Index 0 is the global scope; each
//! function call pushes a function scope holding its locals and its own
//! positional parameters; prefix assignments (`A=1 cmd`) push a temporary
//! scope that is popped when the command finishes.
//!
//! Lookup walks from the innermost scope outward and the first scope that
//! holds the name wins, even when the entry there is unset. Assignment
//! writes to the innermost scope that already holds the name, or to the
//! global scope.

use crate::interpreter::errors::InterpreterError;
use std::collections::{BTreeMap, HashMap};

/// A shell variable. `value` is None for names that are declared
/// (exported, readonly, local) but unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variable {
    pub value: Option<String>,
    pub exported: bool,
    pub readonly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    /// Prefix assignments of a single command
    Temporary,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    vars: HashMap<String, Variable>,
    /// None for temporary scopes, which see their caller's parameters
    positional: Option<Vec<String>>,
}

impl Scope {
    fn new(kind: ScopeKind, positional: Option<Vec<String>>) -> Self {
        Self {
            kind,
            vars: HashMap::new(),
            positional,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableStore {
    scopes: Vec<Scope>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, Some(Vec::new()))],
        }
    }

    /// Add an inherited environment entry (exported, global)
    pub fn import(&mut self, name: &str, value: String) {
        self.scopes[0].vars.insert(
            name.to_string(),
            Variable {
                value: Some(value),
                exported: true,
                readonly: false,
            },
        );
    }

    fn find_index(&self, name: &str) -> Option<usize> {
        self.scopes.iter().rposition(|s| s.vars.contains_key(name))
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.find_index(name)
            .and_then(|i| self.scopes[i].vars.get(name))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.value.as_deref())
    }

    fn entry_mut(&mut self, name: &str) -> &mut Variable {
        let index = self.find_index(name).unwrap_or(0);
        self.scopes[index]
            .vars
            .entry(name.to_string())
            .or_default()
    }

    pub fn set(&mut self, name: &str, value: String) -> Result<(), InterpreterError> {
        let var = self.entry_mut(name);
        if var.readonly {
            return Err(InterpreterError::Readonly {
                name: name.to_string(),
            });
        }
        var.value = Some(value);
        Ok(())
    }

    /// Mark a variable exported, assigning it first when a value is given
    pub fn export(&mut self, name: &str, value: Option<String>) -> Result<(), InterpreterError> {
        let var = self.entry_mut(name);
        if let Some(value) = value {
            if var.readonly {
                return Err(InterpreterError::Readonly {
                    name: name.to_string(),
                });
            }
            var.value = Some(value);
        }
        var.exported = true;
        Ok(())
    }

    pub fn set_readonly(&mut self, name: &str, value: Option<String>) -> Result<(), InterpreterError> {
        let var = self.entry_mut(name);
        if let Some(value) = value {
            if var.readonly {
                return Err(InterpreterError::Readonly {
                    name: name.to_string(),
                });
            }
            var.value = Some(value);
        }
        var.readonly = true;
        Ok(())
    }

    /// Remove a variable. Inside a function or temporary scope the entry
    /// stays as an unset shadow so outer values are not exposed.
    pub fn unset(&mut self, name: &str) -> Result<(), InterpreterError> {
        let Some(index) = self.find_index(name) else {
            return Ok(());
        };
        let scope = &mut self.scopes[index];
        if scope.vars.get(name).is_some_and(|v| v.readonly) {
            return Err(InterpreterError::Readonly {
                name: name.to_string(),
            });
        }
        if index == 0 {
            scope.vars.remove(name);
        } else if let Some(var) = scope.vars.get_mut(name) {
            var.value = None;
            var.exported = false;
        }
        Ok(())
    }

    /// Create a local in the innermost function scope. Without a value the
    /// local starts with the currently visible value.
    pub fn declare_local(&mut self, name: &str, value: Option<String>) -> Result<(), InterpreterError> {
        let Some(index) = self
            .scopes
            .iter()
            .rposition(|s| s.kind == ScopeKind::Function)
        else {
            return self.set(name, value.unwrap_or_default());
        };

        let visible = self.get(name).cloned();
        if let Some(existing) = self.scopes[index].vars.get_mut(name) {
            if let Some(value) = value {
                existing.value = Some(value);
            }
            return Ok(());
        }
        if visible.as_ref().is_some_and(|v| v.readonly) {
            return Err(InterpreterError::Readonly {
                name: name.to_string(),
            });
        }

        let inherited = visible.unwrap_or_default();
        self.scopes[index].vars.insert(
            name.to_string(),
            Variable {
                value: value.or(inherited.value),
                exported: inherited.exported,
                readonly: false,
            },
        );
        Ok(())
    }

    // ===========================================================================
    // SCOPE CHAIN
    // ===========================================================================

    /// Enter a function call with its arguments as positional parameters
    pub fn push_scope(&mut self, args: Vec<String>) {
        self.scopes.push(Scope::new(ScopeKind::Function, Some(args)));
    }

    /// Bind prefix assignments for the duration of one command. The
    /// bindings are exported so child processes see them.
    pub fn push_temp_scope(&mut self, bindings: &[(String, String)]) -> Result<(), InterpreterError> {
        if let Some((name, _)) = bindings
            .iter()
            .find(|(name, _)| self.get(name).is_some_and(|v| v.readonly))
        {
            return Err(InterpreterError::Readonly { name: name.clone() });
        }
        let mut scope = Scope::new(ScopeKind::Temporary, None);
        for (name, value) in bindings {
            scope.vars.insert(
                name.clone(),
                Variable {
                    value: Some(value.clone()),
                    exported: true,
                    readonly: false,
                },
            );
        }
        self.scopes.push(scope);
        Ok(())
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of scopes above the global one
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    // ===========================================================================
    // POSITIONAL PARAMETERS
    // ===========================================================================

    fn positional_index(&self) -> usize {
        self.scopes
            .iter()
            .rposition(|s| s.positional.is_some())
            .unwrap_or(0)
    }

    pub fn positional(&self) -> &[String] {
        self.scopes[self.positional_index()]
            .positional
            .as_deref()
            .unwrap_or(&[])
    }

    /// Replace the positional parameters wholesale
    pub fn set_positional(&mut self, params: Vec<String>) -> Vec<String> {
        let index = self.positional_index();
        self.scopes[index]
            .positional
            .replace(params)
            .unwrap_or_default()
    }

    /// Drop the first n parameters; false when fewer than n exist
    pub fn shift(&mut self, n: usize) -> bool {
        let index = self.positional_index();
        match self.scopes[index].positional.as_mut() {
            Some(params) if n <= params.len() => {
                params.drain(..n);
                true
            }
            _ => false,
        }
    }

    // ===========================================================================
    // LISTINGS
    // ===========================================================================

    /// Every visible variable, inner scopes hiding outer ones
    pub fn visible(&self) -> BTreeMap<&str, &Variable> {
        let mut result = BTreeMap::new();
        for scope in &self.scopes {
            for (name, var) in &scope.vars {
                result.insert(name.as_str(), var);
            }
        }
        result
    }

    /// name=value pairs passed to child processes
    pub fn exported_environment(&self) -> Vec<(String, String)> {
        self.visible()
            .into_iter()
            .filter(|(_, var)| var.exported)
            .filter_map(|(name, var)| var.value.clone().map(|v| (name.to_string(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_assignment_goes_global_without_local() {
        let mut vars = VariableStore::new();
        vars.push_scope(vec![]);
        vars.set("X", "1".into()).unwrap();
        vars.pop_scope();
        assert_eq!(vars.value("X"), Some("1"));
    }

    #[test]
    fn test_local_shadows_and_restores() {
        let mut vars = VariableStore::new();
        vars.set("VAR", "global".into()).unwrap();
        vars.push_scope(vec![]);
        vars.declare_local("VAR", Some("local".into())).unwrap();
        assert_eq!(vars.value("VAR"), Some("local"));
        vars.set("VAR", "changed".into()).unwrap();
        vars.pop_scope();
        assert_eq!(vars.value("VAR"), Some("global"));
    }

    #[test]
    fn test_local_without_value_inherits() {
        let mut vars = VariableStore::new();
        vars.set("V", "outer".into()).unwrap();
        vars.push_scope(vec![]);
        vars.declare_local("V", None).unwrap();
        assert_eq!(vars.value("V"), Some("outer"));
    }

    #[test]
    fn test_unset_local_keeps_shadow() {
        let mut vars = VariableStore::new();
        vars.set("V", "outer".into()).unwrap();
        vars.push_scope(vec![]);
        vars.declare_local("V", Some("inner".into())).unwrap();
        vars.unset("V").unwrap();
        assert_eq!(vars.value("V"), None);
        vars.pop_scope();
        assert_eq!(vars.value("V"), Some("outer"));

        vars.unset("V").unwrap();
        assert!(vars.get("V").is_none());
    }

    #[test]
    fn test_readonly_rejects_changes_and_keeps_value() {
        let mut vars = VariableStore::new();
        vars.set_readonly("R", Some("keep".into())).unwrap();
        assert!(matches!(
            vars.set("R", "new".into()),
            Err(InterpreterError::Readonly { .. })
        ));
        assert!(vars.unset("R").is_err());
        assert_eq!(vars.value("R"), Some("keep"));
    }

    #[test]
    fn test_positional_replacement_leaves_no_residue() {
        let mut vars = VariableStore::new();
        vars.set_positional(args(&["start", "a", "b"]));
        vars.set_positional(args(&["s"]));
        assert_eq!(vars.positional(), &["s".to_string()][..]);
    }

    #[test]
    fn test_function_scope_has_own_positionals() {
        let mut vars = VariableStore::new();
        vars.set_positional(args(&["outer"]));
        vars.push_scope(args(&["x", "y"]));
        assert_eq!(vars.positional().len(), 2);
        assert!(vars.shift(1));
        assert_eq!(vars.positional(), &["y".to_string()][..]);
        assert!(!vars.shift(5));
        vars.pop_scope();
        assert_eq!(vars.positional(), &["outer".to_string()][..]);
    }

    #[test]
    fn test_temp_scope_is_exported_and_popped() {
        let mut vars = VariableStore::new();
        vars.set("A", "old".into()).unwrap();
        vars.set_positional(args(&["p"]));
        vars.push_temp_scope(&[("A".into(), "tmp".into())]).unwrap();
        assert_eq!(vars.value("A"), Some("tmp"));
        assert_eq!(vars.positional().len(), 1);
        assert!(vars
            .exported_environment()
            .contains(&("A".to_string(), "tmp".to_string())));
        vars.pop_scope();
        assert_eq!(vars.value("A"), Some("old"));
    }

    #[test]
    fn test_exported_environment_skips_unset() {
        let mut vars = VariableStore::new();
        vars.export("E", None).unwrap();
        vars.export("F", Some("1".into())).unwrap();
        let env = vars.exported_environment();
        assert_eq!(env, vec![("F".to_string(), "1".to_string())]);
    }
}
