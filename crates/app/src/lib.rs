pub mod config;
pub mod session;

pub use config::{AppConfig, ConfigError};
pub use session::{
    FileOutcome, FileReport, IngestReport, Session, SessionError, SessionState, UploadedFile,
};
