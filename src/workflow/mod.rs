pub mod endpoint;
pub mod http;

pub use endpoint::{WorkflowEndpoint, WorkflowRequest, SEND_MESSAGE_ACTION};
pub use http::HttpWorkflowEndpoint;
