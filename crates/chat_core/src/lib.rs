//! Chat core: pure message ledger, reconciliation state machine and
//! view-model helpers. No IO happens here; side effects are returned as
//! [`Effect`] values for the caller to execute.
mod effect;
mod msg;
mod reconcile;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use reconcile::{Outcome, Reconciliation, FAILURE_PLACEHOLDER, NO_RESPONSE_PLACEHOLDER};
pub use state::{
    ChatState, Message, MessageId, ProcessingStatus, SubmissionFailure, SubmissionId,
};
pub use update::update;
pub use view_model::{ChatViewModel, MessageRowView, PROCESSING_TEXT};
