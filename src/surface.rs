//! Handles to the three pieces of UI the controller drives.
//!
//! The Dioxus app implements these over signals; tests implement them over
//! plain vectors and flags.

use crate::render::LogEntry;

/// The scrollable message log.
pub trait ChatLog {
    /// Identifies one appended entry so it can be removed later.
    type Handle;

    fn append(&mut self, entry: LogEntry) -> Self::Handle;

    /// Removing an entry that is already gone is a no-op.
    fn remove(&mut self, handle: Self::Handle);

    fn scroll_to_latest(&mut self);
}

/// The single-line text input.
pub trait MessageInput {
    fn value(&self) -> String;
    fn clear(&mut self);
    fn set_disabled(&mut self, disabled: bool);
    fn set_placeholder(&mut self, placeholder: &str);
}

/// The send button.
pub trait SubmitControl {
    fn set_disabled(&mut self, disabled: bool);
    fn is_disabled(&self) -> bool;
}
