use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one frame. Closures and child frames keep their parent
/// alive through these handles.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope frame: name → value bindings plus a link to the enclosing frame.
///
/// Lookups are addressed by the resolver's scope distance: `get_at(2, ..)`
/// walks exactly two parent links and reads that frame only. Errors are
/// plain messages; the interpreter attaches the source line.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A root frame holding `values` and no parent.
    pub fn with_values(values: HashMap<String, Value>) -> Self {
        Environment {
            values,
            enclosing: None,
        }
    }

    /// A child of `enclosing` already holding one binding (`this`, `super`).
    pub fn with_binding(enclosing: EnvRef, name: &str, value: Value) -> EnvRef {
        let mut env = Environment::with_enclosing(enclosing);
        env.values.insert(name.to_string(), value);
        Rc::new(RefCell::new(env))
    }

    /// Bind a new name in this frame. Redeclaring within one frame is an error.
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.values.contains_key(name) {
            return Err(format!("Variable '{}' is already defined in this scope.", name));
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Value, String> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| format!("Undefined variable '{}'.", name))
    }

    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("Undefined variable '{}'.", name)),
        }
    }

    /// Read `name` from the frame exactly `distance` links up the chain.
    pub fn get_at(&self, distance: usize, name: &str) -> Result<Value, String> {
        if distance == 0 {
            return self.get(name);
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(distance - 1, name),
            None => Err(format!(
                "Scope chain too short resolving '{}' ({} more frame(s) expected).",
                name, distance
            )),
        }
    }

    /// Overwrite `name` in the frame exactly `distance` links up the chain.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) -> Result<(), String> {
        if distance == 0 {
            return self.assign(name, value);
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
            None => Err(format!(
                "Scope chain too short assigning '{}' ({} more frame(s) expected).",
                name, distance
            )),
        }
    }

    /// Names bound directly in this frame, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }
}
