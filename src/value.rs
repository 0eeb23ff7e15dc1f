//! View values — the closed capability set the renderer dispatches on.
//!
//! A view is a [`Value`]: a tree of scalars, lists, maps, and lambdas.
//! Classification into falsy / truthy / iterable / callable happens once
//! per section resolution, never ad hoc inside the renderer.

use crate::error::{BoxError, RenderError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value supplied by the caller's view, or produced during iteration.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Map),
    Lambda(Lambda),
}

/// Callback handed to two-argument lambdas: renders arbitrary template
/// text against the context stack active at the point of invocation.
pub type RenderFn<'a> = dyn FnMut(&str) -> Result<String, RenderError> + 'a;

/// A callable view value.
///
/// Invocation happens during rendering; the return value is substituted
/// into the output. All three arities accepted by section and variable
/// dispatch are distinct variants so the renderer never guesses.
#[derive(Clone)]
pub enum Lambda {
    /// No arguments; the result is used as the looked-up value.
    Arity0(Arc<dyn Fn() -> Result<Value, BoxError> + Send + Sync>),
    /// One argument: the section body text (raw for `#`, rendered for `|`).
    Arity1(Arc<dyn Fn(&str) -> Result<String, BoxError> + Send + Sync>),
    /// Two arguments: the body text plus a render callback bound to the
    /// current context stack.
    Arity2(Arc<dyn Fn(&str, &mut RenderFn<'_>) -> Result<String, BoxError> + Send + Sync>),
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arity = match self {
            Lambda::Arity0(_) => 0,
            Lambda::Arity1(_) => 1,
            Lambda::Arity2(_) => 2,
        };
        write!(f, "Lambda(arity {arity})")
    }
}

/// Named bindings with two namespaces: plain identifiers (`{{name}}`) and
/// keyword-style symbols (`{{:name}}`).
///
/// Lookup tries the tag's own namespace first, then falls back to the
/// other, matching the permissive lookup templates rely on in practice
/// (a plain tag resolving against keyword-built data and vice versa).
#[derive(Clone, Debug, Default)]
pub struct Map {
    named: HashMap<String, Value>,
    keyed: HashMap<String, Value>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a plain-identifier name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Bind a keyword-style (`:name`) name.
    pub fn insert_key(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.keyed.insert(name.into(), value.into());
        self
    }

    /// Resolve `name`, preferring the namespace the tag was written in.
    pub fn get(&self, name: &str, keyword: bool) -> Option<&Value> {
        if keyword {
            self.keyed.get(name).or_else(|| self.named.get(name))
        } else {
            self.named.get(name).or_else(|| self.keyed.get(name))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.keyed.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Section-dispatch classification, computed once per section resolution.
pub(crate) enum Class<'v> {
    /// Absent, `Null`, `false`, or the empty string.
    Falsy,
    /// A non-iterable, non-callable present value (including maps).
    Truthy(&'v Value),
    /// An ordered collection to iterate over.
    Iterable(&'v [Value]),
    /// A lambda; sections keep callable identity rather than invoking
    /// eagerly the way variable lookup does.
    Callable(&'v Lambda),
}

impl Value {
    /// Falsy per the conditional-section truth table: absent (handled by
    /// the caller), null, `false`, or the empty string.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => true,
            Value::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn classify(&self) -> Class<'_> {
        match self {
            v if v.is_falsy() => Class::Falsy,
            Value::List(items) => Class::Iterable(items),
            Value::Lambda(f) => Class::Callable(f),
            v => Class::Truthy(v),
        }
    }

    /// Canonical text of a scalar, before any escaping. Containers and
    /// lambdas have no text form and yield the empty string.
    pub(crate) fn to_text(&self) -> String {
        match self {
            Value::Null | Value::List(_) | Value::Map(_) | Value::Lambda(_) => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            // `{:?}` keeps the shortest round-trip form and a fractional
            // part on whole floats (6000.0 stays "6000.0").
            Value::Float(x) => format!("{x:?}"),
            Value::Str(s) => s.clone(),
        }
    }

    /// Build a map view from `(name, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(entries.into_iter().collect())
    }

    /// Build a list view from anything convertible to values.
    pub fn list<V, I>(items: I) -> Value
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// A no-argument lambda; invoked on variable lookup.
    pub fn thunk<F>(f: F) -> Value
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Value::Lambda(Lambda::Arity0(Arc::new(move || Ok(f()))))
    }

    /// A one-argument lambda over the section body text.
    pub fn lambda<F>(f: F) -> Value
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Value::Lambda(Lambda::Arity1(Arc::new(move |text| Ok(f(text)))))
    }

    /// A fallible one-argument lambda.
    pub fn try_lambda<F>(f: F) -> Value
    where
        F: Fn(&str) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        Value::Lambda(Lambda::Arity1(Arc::new(f)))
    }

    /// A two-argument lambda receiving the body text and a callback that
    /// renders arbitrary text against the current context stack.
    pub fn lambda_render<F>(f: F) -> Value
    where
        F: Fn(&str, &mut RenderFn<'_>) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        Value::Lambda(Lambda::Arity2(Arc::new(f)))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Value {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Value {
        Value::Map(m)
    }
}

impl From<Lambda> for Value {
    fn from(f: Lambda) -> Value {
        Value::Lambda(f)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Value {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<V: Into<Value> + Clone> From<&[V]> for Value {
    fn from(items: &[V]) -> Value {
        Value::List(items.iter().cloned().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(map: HashMap<String, V>) -> Value {
        Value::Map(map.into_iter().collect())
    }
}

/// A parsed TOML document is a ready-made nested view: tables become maps,
/// arrays become lists, scalars keep their type.
impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Value {
        match v {
            toml::Value::String(s) => Value::Str(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(x) => Value::Float(x),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(d) => Value::Str(d.to_string()),
            toml::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => {
                Value::Map(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
