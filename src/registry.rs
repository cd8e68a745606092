// ABOUTME: Variable/user-function registries and the shared Context, with typed lock-order guards

use crate::error::ErrorKind;
use crate::refgraph;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A user-defined function: its label-bound argument names and its raw,
/// unparsed body text (re-compiled on every call against the caller's
/// supplied argument values, per §4.9 "label binding").
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub labels: Vec<String>,
    pub body: String,
}

/// A flat name -> value table for one domain's variables, with a fixed set
/// of read-only constant names (e.g. `pi`, `e`) that reject overwrite.
pub struct VariableRegistry<V> {
    map: Mutex<HashMap<String, V>>,
    constants: Mutex<HashSet<String>>,
}

impl<V: Clone> VariableRegistry<V> {
    pub fn new(constants: &[&'static str]) -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
            constants: Mutex::new(constants.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn get(&self, name: &str) -> Option<V> {
        self.map.lock().unwrap().get(name).cloned()
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.lock().unwrap().contains(name)
    }

    pub fn set(&self, name: &str, value: V) -> Result<(), ErrorKind> {
        if self.is_constant(name) {
            return Err(ErrorKind::OverwriteConstant(name.to_string()));
        }
        self.map.lock().unwrap().insert(name.to_string(), value);
        Ok(())
    }

    /// Install a constant's value directly, bypassing the overwrite check
    /// (used at `Context` construction time, and by `set_var`'s
    /// `is_constant` flag for caller-defined constants).
    pub fn seed_constant(&self, name: &str, value: V) {
        self.map.lock().unwrap().insert(name.to_string(), value);
        self.constants.lock().unwrap().insert(name.to_string());
    }

    pub fn remove(&self, name: &str) -> Result<(), ErrorKind> {
        if self.is_constant(name) {
            return Err(ErrorKind::OverwriteConstant(name.to_string()));
        }
        self.map.lock().unwrap().remove(name);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.map.lock().unwrap()
    }
}

/// A name -> body table for one domain's user-defined functions.
pub struct UserFunctionRegistry {
    map: Mutex<HashMap<String, UserFunction>>,
}

impl Default for UserFunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UserFunctionRegistry {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<UserFunction> {
        self.map.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.lock().unwrap().contains_key(name)
    }

    /// Define or redefine `name`, rejecting self-reference and cycles
    /// through the existing function table (§9 "circular reference").
    pub fn define(
        &self,
        name: &str,
        labels: Vec<String>,
        body: String,
    ) -> Result<(), ErrorKind> {
        let mut map = self.map.lock().unwrap();
        let mut others: HashMap<String, String> = map
            .iter()
            .filter(|(k, _)| k.as_str() != name)
            .map(|(k, v)| (k.clone(), v.body.clone()))
            .collect();
        refgraph::would_create_cycle(&others, name, &body)?;
        others.insert(name.to_string(), body.clone());
        map.insert(name.to_string(), UserFunction { labels, body });
        log::debug!("defined user function '{name}'");
        Ok(())
    }

    pub fn remove(&self, name: &str) -> bool {
        self.map.lock().unwrap().remove(name).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserFunction>> {
        self.map.lock().unwrap()
    }
}

/// Holds the user-function lock only. Reachable solely via
/// `UserFunctionRegistry::lock_ordered`; the variables lock can only be
/// acquired afterward, enforcing the functions-before-variables order
/// described for the shared context.
pub struct FunctionsLocked<'a> {
    funcs: MutexGuard<'a, HashMap<String, UserFunction>>,
}

impl<'a> FunctionsLocked<'a> {
    pub fn functions(&self) -> &HashMap<String, UserFunction> {
        &self.funcs
    }

    pub fn functions_mut(&mut self) -> &mut HashMap<String, UserFunction> {
        &mut self.funcs
    }

    /// Acquire the variables lock, completing the ordered chain.
    pub fn then_variables<V: Clone>(
        self,
        variables: &'a VariableRegistry<V>,
    ) -> FullyLocked<'a, V> {
        FullyLocked {
            funcs: self.funcs,
            vars: variables.lock(),
        }
    }
}

/// Both the function and variable tables locked together, in the mandated
/// order. Only reachable through `FunctionsLocked::then_variables`.
pub struct FullyLocked<'a, V> {
    funcs: MutexGuard<'a, HashMap<String, UserFunction>>,
    vars: MutexGuard<'a, HashMap<String, V>>,
}

impl<'a, V> FullyLocked<'a, V> {
    pub fn functions(&self) -> &HashMap<String, UserFunction> {
        &self.funcs
    }

    pub fn functions_mut(&mut self) -> &mut HashMap<String, UserFunction> {
        &mut self.funcs
    }

    pub fn variables(&self) -> &HashMap<String, V> {
        &self.vars
    }

    pub fn variables_mut(&mut self) -> &mut HashMap<String, V> {
        &mut self.vars
    }
}

pub fn lock_ordered<'a, V: Clone>(
    functions: &'a UserFunctionRegistry,
    variables: &'a VariableRegistry<V>,
) -> FullyLocked<'a, V> {
    let stage = FunctionsLocked {
        funcs: functions.lock(),
    };
    stage.then_variables(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_reject_overwrite() {
        let reg: VariableRegistry<f64> = VariableRegistry::new(&["pi"]);
        reg.seed_constant("pi", std::f64::consts::PI);
        assert_eq!(reg.set("pi", 3.0), Err(ErrorKind::OverwriteConstant("pi".to_string())));
        assert_eq!(reg.get("pi"), Some(std::f64::consts::PI));
    }

    #[test]
    fn plain_variables_roundtrip() {
        let reg: VariableRegistry<f64> = VariableRegistry::new(&[]);
        reg.set("x", 42.0).unwrap();
        assert_eq!(reg.get("x"), Some(42.0));
        reg.remove("x").unwrap();
        assert_eq!(reg.get("x"), None);
    }

    #[test]
    fn function_registry_rejects_self_reference() {
        let funcs = UserFunctionRegistry::new();
        let err = funcs.define("f", vec!["x".to_string()], "f(x)+1".to_string());
        assert_eq!(err, Err(ErrorKind::SelfReference("f".to_string())));
    }

    #[test]
    fn ordered_lock_exposes_both_tables() {
        let funcs = UserFunctionRegistry::new();
        funcs
            .define("g", vec!["x".to_string()], "x*2".to_string())
            .unwrap();
        let vars: VariableRegistry<f64> = VariableRegistry::new(&[]);
        vars.set("y", 1.0).unwrap();

        let mut locked = lock_ordered(&funcs, &vars);
        assert!(locked.functions().contains_key("g"));
        assert!(locked.variables().contains_key("y"));
        locked.variables_mut().insert("z".to_string(), 2.0);
        drop(locked);
        assert_eq!(vars.get("z"), Some(2.0));
    }
}
