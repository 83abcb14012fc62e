//! Panic dispatch: the decision core that turns a panic action into a
//! remote alert submission or a device-level fallback sequence.

pub mod dispatcher;

pub use dispatcher::{
    AlertEndpoint, AlertRequest, DispatchChannel, DispatchMode, DispatchOutcome, Dispatcher,
    PendingCall, RecipientResult,
};
