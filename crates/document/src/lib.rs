pub mod backend;
pub mod pipeline;

pub use backend::{default_backend, ExtractionError, MockTextBackend, TextBackend, UnavailableBackend};
pub use pipeline::DocumentPipeline;
