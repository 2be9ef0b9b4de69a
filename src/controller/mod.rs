//! State machines for the two user-triggered workflows.
//!
//! - `selection`: material selection -> concurrent fetch cycle
//! - `upload`: dataset form -> validation -> upload
//!
//! Controllers only track state and hand back what to do next; the
//! orchestrator performs the network calls and renders.

pub mod selection;
pub mod upload;

pub use selection::{FetchPhase, FetchRequest, SelectOption, SelectionController, SelectionOutcome, Track};
pub use upload::{UploadController, UploadPhase};
