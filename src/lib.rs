pub mod app;
pub mod constants;
pub mod client;
pub mod errors;
pub mod managers;
pub mod services;
pub mod utils;

pub use crate::client::audience::{CredentialKind, HostFamily};
pub use crate::client::envelope::{OriginRequest, RequestBody, ResultEnvelope};
pub use crate::client::executor::{ApiRequest, RequestExecutor};
pub use crate::client::lro::{OperationPoller, OperationStatus, PollOutcome, PollPolicy};
pub use crate::client::pagination::PaginationContinuer;
pub use crate::client::transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
pub use crate::errors::{ClientError, ClientErrorKind};
pub use crate::managers::dispatcher::{DispatchResult, GenericDispatcher, Operation, Target};
pub use crate::managers::endpoints::{EndpointRegistry, EndpointTemplate};
