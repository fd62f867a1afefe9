//! Gateway Transport - HTTP access to remotely hosted tools

mod client;
mod wire;

pub use client::GatewayClient;
pub use wire::{INVOCATION_ID_HEADER, InvokeRequest, InvokeResponse, InvokeStatus};
