//! Completion request/response value objects shared by the gateway port.

pub mod request;
pub mod response;
