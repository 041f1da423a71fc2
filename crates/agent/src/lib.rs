pub mod client;
pub mod error;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::{CloudAgentClient, RetryPolicy, DEFAULT_BASE_URL};
pub use error::{AppError, ErrorKind, ValidationError};
pub use transport::{
    ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError, TransportErrorKind,
};
pub use types::*;
