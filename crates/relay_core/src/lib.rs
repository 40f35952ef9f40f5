//! Relay core: pure batch bookkeeping and state machines.
//!
//! This crate holds the decision logic of the pipeline with no I/O at all:
//! per-run outcome counters, the manifest gate policy, the run stage
//! transitions, and the interactive login flow. The engine crate drives
//! these around real network and filesystem calls.
mod batch;
mod login;
mod stage;

pub use batch::{BatchOutcome, GateParseError, ManifestGate};
pub use login::{LoginEvent, LoginFlow, LoginState, WaitVerdict};
pub use stage::{RunStage, StageContext};
