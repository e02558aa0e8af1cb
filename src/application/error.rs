use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::render::{RenderConfigError, RenderError},
    config::LoadError,
    domain::toc::TocError,
    infra::error::InfraError,
};

/// Flattened view of an error and its source chain, for logging.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    RenderConfig(#[from] RenderConfigError),
    #[error(transparent)]
    Toc(#[from] TocError),
}

impl AppError {
    /// Process exit code for the command-line harness.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::RenderConfig(_) => 78,
            AppError::Infra(InfraError::Io(_)) => 74,
            AppError::Toc(_) => 65,
            AppError::Infra(_) | AppError::Render(_) => 70,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::Infra(InfraError::Io(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_collects_source_chain() {
        let io = std::io::Error::other("disk gone");
        let error = AppError::from(io);
        let report = ErrorReport::from_error("application::error::AppError", &error);

        assert_eq!(report.messages.first().map(String::as_str), Some("io error: disk gone"));
        assert_eq!(error.exit_code(), 74);
    }

    #[test]
    fn toc_errors_map_to_data_error_code() {
        let error = AppError::from(TocError::UnknownSection { id: "nope".into() });
        assert_eq!(error.exit_code(), 65);
        assert_eq!(error.to_string(), "`nope` is not a table of contents entry");
    }
}
