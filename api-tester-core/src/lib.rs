pub mod models;
pub mod registry;
pub mod transport;
pub mod controller;

// Configuration
pub mod config;
pub mod error;

pub use config::{ApiConfig, ConsoleConfig};
pub use controller::{InvocationController, StateSnapshot};
pub use error::ConsoleError;
pub use models::{
    HttpMethod, InvocationState, InvocationStatus, OperationDescriptor, ParameterMap, Payload,
    SampleInvocation,
};
pub use registry::{resolve, EndpointRegistry};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError};
