//! Generation: request and response values, the backend seam, and the executor
//! that wraps one backend call in retry and a timeout race.

pub mod backend;
pub mod executor;
pub mod request;
pub mod response;

pub use backend::{GenerationBackend, GenerationOptions, OllamaBackend};
pub use executor::{GenerationExecutor, ResponseGenerator};
pub use request::{
    GenerationKind, GenerationRequest, RequestValidationError, MAX_SELECTED_TEXT_CHARS,
};
pub use response::{GenerationContent, GenerationOutcome, GenerationResponse};
