//! Tool discovery and invocation over a ready session.

mod descriptor;
mod error;
mod invoker;
mod registry;
mod result;

pub use descriptor::{InputSchema, ParamKind, ParamSpec, ToolDescriptor};
pub use error::ToolError;
pub use invoker::ToolInvoker;
pub use registry::{ToolRegistry, ToolStub};
pub use result::{ContentBlock, ToolCallResult};
