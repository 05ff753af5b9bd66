//! Interactive resolution of duplicate groups.
//!
//! # Architecture
//!
//! - [`choice`]: the operator's answer for one group and its validation
//! - [`decider`]: the [`DecisionProvider`] seam plus a scripted provider
//! - [`console`]: the terminal prompt provider
//! - [`session`]: the per-group state machine and the shared remaining state
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::DupeReport;
//! use dedupe::resolution::{
//!     ConsoleDecider, ResolutionSession, ResolutionState, SessionOptions,
//! };
//!
//! let state = ResolutionState::new(DupeReport::default());
//! let options = SessionOptions { keep_one: true, ..SessionOptions::default() };
//! let session = ResolutionSession::new(state.clone(), options);
//!
//! let summary = session.run(&mut ConsoleDecider::stdio(), &mut ()).unwrap();
//! println!("{} groups resolved, {} left", summary.groups_resolved, state.len());
//! ```

pub mod choice;
pub mod console;
pub mod decider;
pub mod session;

pub use choice::{Choice, ChoiceError};
pub use console::ConsoleDecider;
pub use decider::{DecisionError, DecisionProvider, ScriptedDecider};
pub use session::{
    ActionRecord, GroupOutcome, GroupResolution, ResolutionSession, ResolutionState,
    SessionObserver, SessionOptions, SessionSummary,
};
