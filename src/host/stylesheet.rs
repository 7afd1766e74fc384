//! Stylesheets and the prototype-level rule mutation methods.

use crate::error::{RecordError, RecordResult};
use crate::host::node::NodeRef;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A style rule container owned by a node.
#[derive(Debug)]
pub struct StyleSheet {
    owner: Weak<crate::host::node::Node>,
    rules: RefCell<Vec<String>>,
}

impl StyleSheet {
    pub(crate) fn new(owner: &NodeRef) -> Rc<Self> {
        Rc::new(Self {
            owner: Rc::downgrade(owner),
            rules: RefCell::new(Vec::new()),
        })
    }

    /// The node that owns this sheet, while it is alive.
    pub fn owner_node(&self) -> Option<NodeRef> {
        self.owner.upgrade()
    }

    pub fn rules(&self) -> Vec<String> {
        self.rules.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.rules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.borrow().is_empty()
    }
}

/// `insertRule(rule, index?)`; returns the index the rule landed at.
pub type InsertRuleFn = Rc<dyn Fn(&StyleSheet, &str, Option<usize>) -> RecordResult<usize>>;

/// `deleteRule(index)`.
pub type DeleteRuleFn = Rc<dyn Fn(&StyleSheet, usize) -> RecordResult<()>>;

/// The rule-mutating methods shared by every stylesheet in a document.
///
/// Replacing an entry affects all sheets, which is how rule edits are
/// intercepted.
pub struct StyleSheetMethods {
    insert_rule: RefCell<InsertRuleFn>,
    delete_rule: RefCell<DeleteRuleFn>,
}

impl StyleSheetMethods {
    /// Methods with the host's own behavior.
    pub fn native() -> Self {
        Self {
            insert_rule: RefCell::new(Rc::new(native_insert_rule)),
            delete_rule: RefCell::new(Rc::new(native_delete_rule)),
        }
    }

    pub fn insert_rule(&self) -> InsertRuleFn {
        self.insert_rule.borrow().clone()
    }

    pub fn delete_rule(&self) -> DeleteRuleFn {
        self.delete_rule.borrow().clone()
    }

    /// Install a new `insertRule`, returning the one it replaced.
    pub fn replace_insert_rule(&self, method: InsertRuleFn) -> InsertRuleFn {
        std::mem::replace(&mut *self.insert_rule.borrow_mut(), method)
    }

    /// Install a new `deleteRule`, returning the one it replaced.
    pub fn replace_delete_rule(&self, method: DeleteRuleFn) -> DeleteRuleFn {
        std::mem::replace(&mut *self.delete_rule.borrow_mut(), method)
    }
}

fn native_insert_rule(sheet: &StyleSheet, rule: &str, index: Option<usize>) -> RecordResult<usize> {
    let mut rules = sheet.rules.borrow_mut();
    let index = index.unwrap_or(0);
    if index > rules.len() {
        return Err(RecordError::IndexSize {
            index,
            len: rules.len(),
        });
    }
    rules.insert(index, rule.to_string());
    Ok(index)
}

fn native_delete_rule(sheet: &StyleSheet, index: usize) -> RecordResult<()> {
    let mut rules = sheet.rules.borrow_mut();
    if index >= rules.len() {
        return Err(RecordError::IndexSize {
            index,
            len: rules.len(),
        });
    }
    rules.remove(index);
    Ok(())
}
