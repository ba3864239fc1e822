//! Interaction layer: the HTTP gateway to the advisor backend.
//!
//! - `dto`: backend wire formats and their conversion to domain types
//! - `gateway`: [`ApiGatewayClient`], the reqwest implementation of
//!   `advisor_core::api::AdvisorApi`

pub mod dto;
pub mod gateway;

pub use gateway::{ApiGatewayClient, SEND_FAILED};
