//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::TargetId;

// Registrations under construction on this thread, outermost first. Shared by
// every resolution the thread runs, so a factory that re-enters the container
// through an injected `Container` or `ServiceLocator` still sees its callers.
thread_local! {
    static BUILDING: RefCell<Vec<(Key, TargetId)>> = RefCell::new(Vec::new());
}

/// One frame on the thread's resolution path, popped on drop.
///
/// Each frame records the key that was asked for and the registration that
/// answered it. Entering a registration that is already on the path is a cycle;
/// without this check the nested request would wait forever on the slot its
/// own caller is filling.
#[must_use]
pub(crate) struct PathGuard {
    target: TargetId,
}

impl PathGuard {
    /// Pushes a frame, failing with the full cycle if `target` is already being built.
    pub(crate) fn enter(key: Key, target: TargetId) -> DiResult<Self> {
        BUILDING.with(|frames| {
            let mut frames = frames.borrow_mut();
            if let Some(start) = frames.iter().position(|(_, id)| *id == target) {
                let mut cycle: Vec<&'static str> = frames[start..]
                    .iter()
                    .map(|(k, _)| k.display_name())
                    .collect();
                cycle.push(key.display_name());
                return Err(DiError::Circular(cycle));
            }
            frames.push((key, target));
            Ok(Self { target })
        })
    }

    /// Number of registrations under construction on this thread.
    pub(crate) fn depth() -> usize {
        BUILDING.with(|frames| frames.borrow().len())
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        BUILDING.with(|frames| {
            let popped = frames.borrow_mut().pop();
            debug_assert_eq!(popped.map(|(_, id)| id), Some(self.target), "unbalanced resolution path");
        });
    }
}
