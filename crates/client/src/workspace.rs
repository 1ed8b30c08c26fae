//! Workspace override scoping.
//!
//! Sync resources live in workspaces. The client carries an optional
//! workspace override that the transport injects as a `workspaceId` query
//! parameter on every request. [`WorkspaceScope`] sets the override for
//! the lifetime of the guard and restores the previous value on drop, so
//! an early `?` return cannot leave the client pointed at the wrong
//! workspace.

use crate::transport::WorkspaceSlot;

/// RAII guard that scopes requests to a workspace until dropped.
#[must_use = "the override is cleared as soon as the guard is dropped"]
pub struct WorkspaceScope {
    slot: WorkspaceSlot,
    previous: Option<String>,
}

impl WorkspaceScope {
    pub(crate) fn new(slot: WorkspaceSlot, workspace: Option<String>) -> Self {
        let previous = {
            let mut current = slot.lock().expect("workspace slot poisoned");
            std::mem::replace(&mut *current, workspace)
        };
        Self { slot, previous }
    }

    /// The workspace currently in effect, if any.
    pub fn workspace(&self) -> Option<String> {
        self.slot
            .lock()
            .expect("workspace slot poisoned")
            .clone()
    }
}

impl Drop for WorkspaceScope {
    fn drop(&mut self) {
        let mut current = self.slot.lock().expect("workspace slot poisoned");
        *current = self.previous.take();
    }
}
