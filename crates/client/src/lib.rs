//! Async client for the OXN experiment backend: request state, file ingest,
//! submission orchestration and status refresh.

pub mod api;
pub mod error;
pub mod ingest;
pub mod orchestrator;
pub mod refresher;
pub mod request;
pub mod transport;

pub use api::{DownloadKind, ExperimentApi};
pub use error::{ClientError, TransportError};
pub use ingest::read_and_parse;
pub use orchestrator::{BoundIds, Orchestrator, Phase};
pub use refresher::StatusRefresher;
pub use request::{Notice, RequestClient, RequestPolicy, RequestState, FALLBACK_ERROR};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
