//! KSeF session handling, submission and status polling

pub mod ports;
mod session;
mod status;
mod submission;

pub use session::SessionNegotiator;
pub use status::{OutcomeLevel, StatusCheckOutcome, StatusPoller};
pub use submission::{SubmissionOrchestrator, SubmissionOutcome};
