pub mod handler;
pub mod protocol;

pub use handler::McpHandler;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo};
