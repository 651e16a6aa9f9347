//! Per-state handler table
//!
//! Maps `(state, action)` to the effect the session performs and the state it
//! moves to. Pairs missing from the table are ignored by the session.
//!
//! Only action-driven moves live here. Answering the call and resolving the
//! mailbox are state entry actions of `init` and `auth`, and their targets
//! belong to the session machine.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::types::{MenuAction, MenuState};

/// Synchronous mailbox reader operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderOp {
    First,
    Replay,
    Next,
    Prev,
    Delete,
    ChangeFolder,
    PreviousMenu,
    RepeatMenu,
}

/// What a handler does with a resolved action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Hold the action in the deferred slot until `until` is entered
    Defer { until: MenuState },
    /// Ask the auth context to verify the argument as a password (suspends)
    Verify,
    /// Call a reader operation
    Reader(ReaderOp),
    /// Ask the reader to commit the argument as a folder option (suspends)
    SubmitFolder,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct StateKey {
    pub state: MenuState,
    pub action: MenuAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub effect: Effect,
    /// For synchronous effects, the state entered once the effect ran. For
    /// suspending effects, the state entered when the operation succeeds.
    /// `None` stays in the current state.
    pub next_state: Option<MenuState>,
}

lazy_static! {
    /// The menu handler table
    pub static ref MENU_TABLE: HashMap<StateKey, Transition> = build_menu_table();
}

fn build_menu_table() -> HashMap<StateKey, Transition> {
    let mut table = HashMap::new();
    let mut add = |state, action, effect, next_state| {
        table.insert(StateKey { state, action }, Transition { effect, next_state });
    };

    // Password typed before the mailbox lookup finished
    add(
        MenuState::Auth,
        MenuAction::Authenticate,
        Effect::Defer { until: MenuState::WaitingForAuth },
        None,
    );

    add(MenuState::WaitingForAuth, MenuAction::Authenticate, Effect::Verify, Some(MenuState::Ready));

    for (action, op) in [
        (MenuAction::First, ReaderOp::First),
        (MenuAction::Replay, ReaderOp::Replay),
        (MenuAction::Next, ReaderOp::Next),
        (MenuAction::Prev, ReaderOp::Prev),
        (MenuAction::Delete, ReaderOp::Delete),
        (MenuAction::PreviousMenu, ReaderOp::PreviousMenu),
        (MenuAction::RepeatMenu, ReaderOp::RepeatMenu),
    ] {
        add(MenuState::Ready, action, Effect::Reader(op), None);
    }
    add(
        MenuState::Ready,
        MenuAction::ChangeFolder,
        Effect::Reader(ReaderOp::ChangeFolder),
        Some(MenuState::ChangingFolder),
    );

    add(MenuState::ChangingFolder, MenuAction::Submit, Effect::SubmitFolder, Some(MenuState::Ready));
    add(
        MenuState::ChangingFolder,
        MenuAction::PreviousMenu,
        Effect::Reader(ReaderOp::PreviousMenu),
        Some(MenuState::Ready),
    );
    add(
        MenuState::ChangingFolder,
        MenuAction::RepeatMenu,
        Effect::Reader(ReaderOp::RepeatMenu),
        None,
    );

    table
}

pub fn lookup(state: MenuState, action: MenuAction) -> Option<&'static Transition> {
    MENU_TABLE.get(&StateKey { state, action })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn authenticate_is_deferred_during_auth() {
        let t = lookup(MenuState::Auth, MenuAction::Authenticate).unwrap();
        assert_eq!(t.effect, Effect::Defer { until: MenuState::WaitingForAuth });
        assert_eq!(t.next_state, None);
    }

    #[test]
    fn ready_dispatches_reader_ops_in_place() {
        for action in [
            MenuAction::First,
            MenuAction::Replay,
            MenuAction::Next,
            MenuAction::Prev,
            MenuAction::Delete,
            MenuAction::PreviousMenu,
            MenuAction::RepeatMenu,
        ] {
            let t = lookup(MenuState::Ready, action).unwrap();
            assert!(matches!(t.effect, Effect::Reader(_)), "{action}");
            assert_eq!(t.next_state, None, "{action}");
        }
        let t = lookup(MenuState::Ready, MenuAction::ChangeFolder).unwrap();
        assert_eq!(t.next_state, Some(MenuState::ChangingFolder));
    }

    #[test]
    fn folder_menu_transitions() {
        let submit = lookup(MenuState::ChangingFolder, MenuAction::Submit).unwrap();
        assert_eq!(submit.effect, Effect::SubmitFolder);
        assert_eq!(submit.next_state, Some(MenuState::Ready));

        let back = lookup(MenuState::ChangingFolder, MenuAction::PreviousMenu).unwrap();
        assert_eq!(back.effect, Effect::Reader(ReaderOp::PreviousMenu));
        assert_eq!(back.next_state, Some(MenuState::Ready));

        let repeat = lookup(MenuState::ChangingFolder, MenuAction::RepeatMenu).unwrap();
        assert_eq!(repeat.next_state, None);

        assert!(lookup(MenuState::ChangingFolder, MenuAction::Delete).is_none());
    }

    #[test]
    fn nothing_is_handled_in_init_or_done() {
        for action in MenuAction::iter() {
            assert!(lookup(MenuState::Init, action).is_none());
            assert!(lookup(MenuState::Done, action).is_none());
        }
    }

    #[test]
    fn no_transition_targets_init() {
        for t in MENU_TABLE.values() {
            assert_ne!(t.next_state, Some(MenuState::Init));
            assert_ne!(t.next_state, Some(MenuState::Done));
        }
    }
}
