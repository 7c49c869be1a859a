//! Multicast subjects.
//!
//! [`Subject`] forwards every notification to its current subscribers.
//! [`ReplaySubject`] additionally keeps a bounded backlog and replays it to
//! each new subscriber before going live.

mod capacity;
mod replay_buffer;
mod replay_source;
mod replay_subject;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use capacity::BufferCapacity;
pub use replay_buffer::{ReplayBuffer, Snapshot};
pub use replay_subject::{ReplaySubject, WeakReplaySubject};
pub use subject_core::{Subject, TerminalState, WeakSubject};
pub use subject_subscription::SubjectSubscription;
