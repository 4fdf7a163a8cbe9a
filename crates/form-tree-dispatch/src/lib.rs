//! Hierarchical dispatch over component ids.
//!
//! Component ids encode the ancestry of a component (`root_gatherings_0`
//! is inside `root_gatherings`, which is inside `root`). Both dispatchers in
//! this crate use that to deliver a signal to the innermost interested
//! ancestor first and let it decide whether outer ancestors see it too:
//!
//! - [`EventBus`] for named events between components.
//! - [`ShortcutDispatcher`] for key presses bound through declarative
//!   shortcuts.
//!
//! Everything here is single-threaded: handles are `Rc` based and must stay
//! on the thread of the form they belong to.

pub mod bus;
pub mod dispatcher;
pub mod owners;
pub mod shortcut;

pub use bus::{EventBus, ListenerId, SendOptions};
pub use dispatcher::{
    Blocker, BlockerGuard, DispatchConfig, KeyHandler, KeyOutcome, SharedState, ShortcutDispatcher,
    DEFAULT_ESCAPE_REGION,
};
pub use owners::owners_of;
pub use shortcut::{
    resolve_target, Condition, KeyCombo, KeyEvent, Modifier, Modifiers, Shortcut, ShortcutTable,
    ShortcutTarget,
};

/// What a listener or key function tells the dispatcher after running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// Handled; no further listener or owner is invoked.
    #[default]
    Stop,
    /// Not handled; continue with the next listener, then the next less
    /// specific owner.
    Continue,
}

impl From<bool> for Propagation {
    /// `false` reads as "not handled".
    fn from(handled: bool) -> Self {
        if handled {
            Propagation::Stop
        } else {
            Propagation::Continue
        }
    }
}
