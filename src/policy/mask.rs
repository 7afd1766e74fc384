//! Input value masking.
//!
//! Masked text is length-preserving: one placeholder per character of the
//! original value, so replay keeps field widths without revealing content.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// Placeholder character used for masked values.
pub const MASK_CHAR: char = '*';

/// Decides whether a field's value must be redacted, and how.
pub trait MaskPolicy {
    /// `name` is a lower-case tag name or input type.
    fn should_mask(&self, name: &str) -> bool;

    /// Redact a value. Must preserve the character count.
    fn mask(&self, value: &str) -> String {
        mask_value(value)
    }
}

pub fn mask_value(value: &str) -> String {
    std::iter::repeat(MASK_CHAR)
        .take(value.chars().count())
        .collect()
}

/// Mask by tag or type membership, e.g. `{"password", "email", "textarea"}`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskInputOptions {
    names: BTreeSet<String>,
    #[serde(skip)]
    mask_fn: Option<Rc<dyn Fn(&str) -> String>>,
}

impl MaskInputOptions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.into().to_ascii_lowercase())
                .collect(),
            mask_fn: None,
        }
    }

    /// Use a custom redaction function instead of the placeholder fill.
    ///
    /// The function should keep the character count of its input.
    pub fn with_mask_fn(mut self, mask_fn: impl Fn(&str) -> String + 'static) -> Self {
        self.mask_fn = Some(Rc::new(mask_fn));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for MaskInputOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskInputOptions")
            .field("names", &self.names)
            .field("custom_mask_fn", &self.mask_fn.is_some())
            .finish()
    }
}

impl PartialEq for MaskInputOptions {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl MaskPolicy for MaskInputOptions {
    fn should_mask(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn mask(&self, value: &str) -> String {
        match self.mask_fn {
            Some(ref mask_fn) => mask_fn(value),
            None => mask_value(value),
        }
    }
}
