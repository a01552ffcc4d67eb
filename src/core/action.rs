//! # Actions
//!
//! Everything the engine can be asked to do becomes an `Action`.
//! The UI pressing "Login"? That's `Action::Login`. The ticker firing?
//! That's `Action::Tick`.
//!
//! Actions carry no payload. The dispatcher reads whatever it needs (the
//! current connection mode, the last flux) from the state store at the moment
//! it starts the action.
//!
//! ```text
//! producer ── enqueue(Action) ──▶ ActionQueue ──▶ worker ──▶ UpdateMsg set ──▶ observers
//! ```

/// An intent to perform work. Consumed exactly once by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Timer,
    Tick,
    Login,
    Logout,
    Flux,
    Online,
    Details,
}

impl Action {
    /// Timer-originated refreshes, refused while a user-initiated
    /// conversation is in flight.
    pub fn is_automatic(self) -> bool {
        matches!(self, Action::Timer | Action::Tick)
    }
}

/// Which part of the snapshot an action changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateMsg {
    Log,
    Flux,
    Online,
    Details,
}
