//! Names for memory cells and labels, and the stack of expression results.

use crate::result::{BackendError, BackendResult};

/// Mints names that are unique across the whole program and tracks the tags
/// holding the values of the expressions being evaluated.
#[derive(Debug, Default)]
pub struct TagPool {
    counter: u32,
    active: Vec<String>,
}

impl TagPool {
    /// The next number of the shared counter.
    pub fn next_id(&mut self) -> u32 {
        let id = self.counter;
        self.counter += 1;
        id
    }

    /// `<prefix><n>`
    pub fn fresh(&mut self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id())
    }

    /// `<name>_<n>`, for variables and functions.
    pub fn named(&mut self, name: &str) -> String {
        format!("{name}_{}", self.next_id())
    }

    /// A fresh temporary, pushed as the newest active tag.
    pub fn temp(&mut self) -> String {
        let tag = self.fresh("t");
        self.active.push(tag.clone());
        tag
    }

    pub fn push(&mut self, tag: String) {
        self.active.push(tag);
    }

    pub fn pop(&mut self) -> BackendResult<String> {
        self.active.pop().ok_or_else(|| BackendError::Impossible("no expression result to consume".to_owned()))
    }

    /// The two newest tags, older first.
    pub fn pop2(&mut self) -> BackendResult<(String, String)> {
        let newer = self.pop()?;
        let older = self.pop()?;
        Ok((older, newer))
    }

    pub fn is_balanced(&self) -> bool {
        self.active.is_empty()
    }
}
