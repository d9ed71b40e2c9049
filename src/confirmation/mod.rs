//! Confirmation request lifecycle.
//!
//! Requests are created PENDING when an operation needs a human decision
//! and move exactly once to APPROVED, DENIED or CANCELLED. Nothing expires
//! on its own; a caller that wants a deadline cancels the request itself.
//! An APPROVED request can be executed at most once; settled requests stay
//! in the store until a collaborator removes or prunes them.

mod request;
mod store;

pub use request::{
    ConfirmationRequest, ConfirmationStatus, ExecutionRecord, NewConfirmation, REQUEST_ID_PREFIX,
    RequestId, Resolution, ResolutionNote,
};
pub use store::ConfirmationStore;
