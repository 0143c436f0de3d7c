//! # sprig
//!
//! A minimal reactive UI component runtime: templates stay plain
//! functions from a context to markup, and [`Component`] wraps them with
//! the three behaviors a component actually needs:
//!
//! - **Lifecycle** - a closed event chain (`init` -> `render` ->
//!   `mounted` -> `updated`) driven through a per-instance
//!   [`EventBus`], with the first render completing synchronously
//!   inside the constructor.
//! - **Reactive props** - writes merge through
//!   [`Component::set_props`]; a shallow before/after comparison (or a
//!   custom [`Hooks::should_update`] gate) decides whether the write
//!   re-renders. Deletion is rejected.
//! - **Composition** - children are passed by name in the construction
//!   [`Bag`]; the template emits placeholder markup for each child key
//!   and the runtime splices the child's rendered subtree over its
//!   `data-id` stub.
//!
//! Rendering targets an inert in-crate node tree ([`NodeRef`]) rather
//! than a live document; an external driver decides when content enters
//! the document and signals it via [`Component::dispatch_mounted`].
//!
//! ```
//! use sprig::{template, Bag, Component, Slot};
//!
//! let item = template(|ctx| format!("<li>{}</li>", ctx["label"].as_str().unwrap()));
//! let list = template(|ctx| format!("<ul>{}</ul>", ctx["entries"].as_str().unwrap()));
//!
//! let mut first = Bag::new();
//! first.insert("label".into(), "one".into());
//! let mut second = Bag::new();
//! second.insert("label".into(), "two".into());
//!
//! let mut bag = Bag::new();
//! bag.insert(
//!     "entries".into(),
//!     Slot::from(vec![
//!         Component::new(item.clone(), first).unwrap(),
//!         Component::new(item, second).unwrap(),
//!     ]),
//! );
//!
//! let menu = Component::new(list, bag).unwrap();
//! assert_eq!(
//!     menu.content().unwrap().outer_html(),
//!     "<ul><li>one</li><li>two</li></ul>",
//! );
//! ```

pub mod bus;
pub mod component;
pub mod dom;
pub mod error;
pub mod registry;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

// Component surface
pub use component::{Child, Component, Hooks, PropStore, CLASSES_KEY, EVENTS_KEY};

// Lifecycle & events
pub use bus::{EventArgs, EventBus, Handler, HandlerId, Lifecycle};

// Values & templates
pub use types::{
    template, Bag, Callback, EventMap, PropMap, PropValue, Slot, Template, TemplateContext,
};

// Document model
pub use dom::{DomHandler, NodeRef};

// Errors
pub use error::Error;
