//! In-process host model.
//!
//! This module stands in for the environment that delivers change
//! notifications: a node tree with form state, an event-listener registry,
//! batched structural-change notifications, a property-descriptor table for
//! form-control prototypes and the stylesheet rule-mutation methods.

pub mod document;
pub mod events;
pub mod mutation;
pub mod node;
pub mod property;
pub mod stylesheet;

// Re-export commonly used types
pub use document::{Document, MutationHandler};
pub use events::{EventHandler, EventKind, HostEvent, Point};
pub use mutation::MutationRecord;
pub use node::{Node, NodeKind, NodeRef};
pub use property::{
    ElementClass, PropertyDescriptor, PropertyKey, PropertyTable, PropertyValue, Setter,
    FORM_PROPERTIES,
};
pub use stylesheet::{DeleteRuleFn, InsertRuleFn, StyleSheet, StyleSheetMethods};
