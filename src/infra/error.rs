use std::path::PathBuf;

use thiserror::Error;

/// Infrastructure errors that can occur during application startup.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("TCP bind failed")]
    TcpBind(#[source] std::io::Error),

    #[error("Server error")]
    Server(#[source] std::io::Error),

    #[error("Cannot create log file {}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
