//! Core value types for the component runtime.
//!
//! The construction contract is a single bag of named [`Slot`]s: each
//! entry is decided *at the call site* to be a plain property, a single
//! child component, or an ordered child sequence. No runtime structural
//! inspection ever re-derives that decision, and a key resolves to
//! exactly one of the three.
//!
//! Property values are themselves a tagged union ([`PropValue`]):
//! template-visible data, bound functions, or the reserved `events`
//! listener map.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::{Component, PropStore};
use crate::dom::DomHandler;

// =============================================================================
// Property Values
// =============================================================================

/// Function-valued property: invoked with the owning property store as
/// its context, mirroring method-style props.
pub type Callback = Rc<dyn Fn(&PropStore) -> Value>;

/// The reserved `events` property: document event name to handler.
pub type EventMap = BTreeMap<String, DomHandler>;

/// Shallow property map - the unit the update gate compares.
pub type PropMap = BTreeMap<String, PropValue>;

/// A single reactive property value.
#[derive(Clone)]
pub enum PropValue {
    /// Arbitrary data, visible to the template as-is.
    Data(Value),
    /// A function bound to the property store.
    Func(Callback),
    /// Document event listeners, attached to the rendered root on every
    /// render and detached from the node it replaces.
    Events(EventMap),
}

impl PropValue {
    /// Build an [`Events`](PropValue::Events) value from pairs.
    pub fn events<'a>(pairs: impl IntoIterator<Item = (&'a str, DomHandler)>) -> Self {
        Self::Events(
            pairs
                .into_iter()
                .map(|(name, handler)| (name.to_string(), handler))
                .collect(),
        )
    }

    /// The data value, if this is a `Data` property.
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// The data value as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(Value::as_str)
    }
}

/// Shallow equality: data by value, functions and listeners by handler
/// identity. This is the comparison the default update gate performs -
/// nested mutation behind a `Data` value is invisible by design.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => Rc::ptr_eq(a, b),
            (Self::Events(a), Self::Events(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, ha), (kb, hb))| ka == kb && Rc::ptr_eq(ha, hb))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => write!(f, "Data({value})"),
            Self::Func(_) => f.write_str("Func(..)"),
            Self::Events(map) => {
                let names: Vec<&str> = map.keys().map(String::as_str).collect();
                write!(f, "Events({names:?})")
            }
        }
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Data(Value::from(value))
    }
}

// =============================================================================
// Construction Bag
// =============================================================================

/// One named entry of the construction bag.
pub enum Slot {
    /// A reactive property.
    Prop(PropValue),
    /// A single named child component.
    Child(Component),
    /// An ordered sequence of child components under one key.
    Children(Vec<Component>),
}

/// The construction input: named values, each already decided to be a
/// prop, a child, or a child sequence.
pub type Bag = BTreeMap<String, Slot>;

impl From<PropValue> for Slot {
    fn from(value: PropValue) -> Self {
        Self::Prop(value)
    }
}

impl From<Component> for Slot {
    fn from(child: Component) -> Self {
        Self::Child(child)
    }
}

impl From<Vec<Component>> for Slot {
    fn from(children: Vec<Component>) -> Self {
        Self::Children(children)
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Self::Prop(PropValue::Data(value))
    }
}

impl From<&str> for Slot {
    fn from(value: &str) -> Self {
        Self::Prop(value.into())
    }
}

impl From<String> for Slot {
    fn from(value: String) -> Self {
        Self::Prop(value.into())
    }
}

impl From<bool> for Slot {
    fn from(value: bool) -> Self {
        Self::Prop(value.into())
    }
}

impl From<i64> for Slot {
    fn from(value: i64) -> Self {
        Self::Prop(value.into())
    }
}

// =============================================================================
// Template Collaborator
// =============================================================================

/// Context handed to the template: the `Data` props plus one placeholder
/// markup string per child key.
pub type TemplateContext = BTreeMap<String, Value>;

/// The templating collaborator: a pure function from context to markup.
/// It must not reach for children itself - they arrive as placeholder
/// markup in the context.
pub type Template = Rc<dyn Fn(&TemplateContext) -> String>;

/// Wrap a closure as a [`Template`].
pub fn template(f: impl Fn(&TemplateContext) -> String + 'static) -> Template {
    Rc::new(f)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_equality_is_by_value() {
        assert_eq!(PropValue::from("save"), PropValue::from("save"));
        assert_ne!(PropValue::from("save"), PropValue::from("saved"));
        assert_eq!(
            PropValue::Data(json!({"a": 1})),
            PropValue::Data(json!({"a": 1}))
        );
    }

    #[test]
    fn test_func_equality_is_by_identity() {
        let f: Callback = Rc::new(|_| Value::Null);
        let g: Callback = Rc::new(|_| Value::Null);
        assert_eq!(PropValue::Func(Rc::clone(&f)), PropValue::Func(f));
        assert_ne!(PropValue::Func(Rc::new(|_| Value::Null)), PropValue::Func(g));
    }

    #[test]
    fn test_events_equality_is_by_handler_identity() {
        let click: DomHandler = Rc::new(|| {});
        let a = PropValue::events([("click", Rc::clone(&click))]);
        let b = PropValue::events([("click", click)]);
        let c = PropValue::events([("click", Rc::new(|| {}) as DomHandler)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_data_never_equals_other_variants() {
        let func = PropValue::Func(Rc::new(|_| Value::Null));
        assert_ne!(PropValue::from("x"), func);
    }

    #[test]
    fn test_prop_value_accessors() {
        let value = PropValue::from("label");
        assert_eq!(value.as_str(), Some("label"));
        assert_eq!(value.as_data(), Some(&json!("label")));
        assert!(PropValue::Func(Rc::new(|_| Value::Null)).as_data().is_none());
    }
}
