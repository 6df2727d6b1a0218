//! Parley core: configuration, message model, and the error taxonomy shared by
//! the agent runtime, the HTTP server, and the operator CLI.

pub mod config;
pub mod domain;
pub mod errors;

pub use domain::message::{
    ClassificationResult, Entities, EntityValue, HandlerOutcome, InboundMessage,
};
pub use errors::{HandlerError, ServiceError, ServiceErrorKind};
