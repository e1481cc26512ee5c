//! Lexical scopes.
//!
//! An [`Environment`] owns one scope's bindings and a shared handle to its
//! enclosing scope.  Handles are `Rc<RefCell<_>>` because a scope can outlive
//! the block that created it when a closure captures it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The global (root) scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up here, then outward through the enclosing scopes.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Overwrite the innermost existing binding of `name`.
    ///
    /// Never creates a binding: assigning an undeclared name is an error.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Walk exactly `distance` links outward.  `None` means the chain is
    /// shorter than the resolver promised.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the scope exactly `distance` links out, without
    /// searching any other scope.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        Self::ancestor(env, distance)?.borrow().values.get(name).cloned()
    }

    /// Write `name` in the scope exactly `distance` links out.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let target = Self::ancestor(env, distance)
            .ok_or_else(|| RuntimeError::undefined_variable(name))?;

        target.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    fn shared(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn get_walks_outward() {
        let globals = shared(Environment::new());
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals));

        assert_eq!(inner.get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_undefined_is_an_error() {
        let env = Environment::new();

        let err = env.get(&ident("missing")).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    fn define_overwrites_in_same_scope() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Number(2.0));

        assert_eq!(env.get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn assign_updates_nearest_binding_only() {
        let globals = shared(Environment::new());
        globals.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(Rc::clone(&globals));
        inner.assign(&ident("a"), Value::Number(5.0)).unwrap();

        assert_eq!(globals.borrow().get(&ident("a")).unwrap(), Value::Number(5.0));
        assert!(inner.values.is_empty());
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let mut env = Environment::new();

        assert!(env.assign(&ident("ghost"), Value::Nil).is_err());
        assert!(env.get(&ident("ghost")).is_err());
    }

    #[test]
    fn get_at_ignores_shadowing_scopes() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("a", Value::String("outer".into()));

        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));
        inner.borrow_mut().define("a", Value::String("inner".into()));

        assert_eq!(
            Environment::get_at(&inner, 1, "a"),
            Some(Value::String("outer".into()))
        );
        assert_eq!(
            Environment::get_at(&inner, 0, "a"),
            Some(Value::String("inner".into()))
        );
    }

    #[test]
    fn assign_at_targets_exact_scope() {
        let outer = shared(Environment::new());
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner = shared(Environment::with_enclosing(Rc::clone(&outer)));
        inner.borrow_mut().define("a", Value::Number(2.0));

        Environment::assign_at(&inner, 1, &ident("a"), Value::Number(10.0)).unwrap();

        assert_eq!(Environment::get_at(&outer, 0, "a"), Some(Value::Number(10.0)));
        assert_eq!(Environment::get_at(&inner, 0, "a"), Some(Value::Number(2.0)));
    }

    #[test]
    fn ancestor_past_root_is_none() {
        let root = shared(Environment::new());

        assert!(Environment::ancestor(&root, 0).is_some());
        assert!(Environment::ancestor(&root, 1).is_none());
    }
}
