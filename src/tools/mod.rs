//! Tool System - gateway tool descriptors, adapters, and routing
//!
//! The catalog is fetched from the gateway, wrapped one adapter per tool, and
//! held by the registry as an immutable snapshot. Routers execute validated
//! invocations.

mod adapter;
mod catalog;
mod definition;
mod invocation;
mod registry;
mod router;
mod schema;

pub use adapter::{ToolAdapter, ToolOutput};
pub use catalog::ToolCatalog;
pub use definition::{ResultShape, ToolDescriptor};
pub use invocation::{ToolFailure, ToolInvocation, ToolOutcome, ToolResult};
pub use registry::{RegistrySnapshot, ToolRegistry};
pub use router::{MockToolRouter, ToolRouter, dispatch_all};
pub use schema::validate_arguments;
