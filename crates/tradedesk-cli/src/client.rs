//! Application context, CLI error type and mapping of flow failures.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use tradedesk_client::HttpAccountStore;
use tradedesk_config::ClientSettings;
use tradedesk_core::{AccountStore, OwnerId, RemoteFetchError, RemoteWriteError, WriteFailureKind};
use tradedesk_sync::{EndpointError, FlowError, Notice, Session};

use crate::cli::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }

    /// Replace the message with a user-facing notice, keeping the exit class.
    ///
    /// Validation detail that the notice does not already carry is appended.
    pub(crate) fn noticed(self, notice: &Notice) -> Self {
        match self {
            Self::Validation(detail) if detail != notice.description => {
                Self::Validation(format!("{notice} ({detail})"))
            }
            Self::Validation(_) => Self::Validation(notice.to_string()),
            Self::Failure(_) => Self::Failure(anyhow!("{notice}")),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<FlowError> for CliError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(violations) => Self::validation(violations.to_string()),
            FlowError::Remote(remote) => remote.into(),
        }
    }
}

impl From<RemoteWriteError> for CliError {
    fn from(err: RemoteWriteError) -> Self {
        match err.kind {
            WriteFailureKind::Rejected | WriteFailureKind::NotFound => {
                Self::validation(err.message)
            }
            WriteFailureKind::Transport | WriteFailureKind::Malformed => {
                Self::failure(anyhow!(err.message))
            }
        }
    }
}

impl From<RemoteFetchError> for CliError {
    fn from(err: RemoteFetchError) -> Self {
        Self::failure(err)
    }
}

impl From<EndpointError> for CliError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Config(config) => Self::validation(config.to_string()),
            offline @ EndpointError::Unreachable { .. } => Self::failure(offline),
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) session: Session,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    /// Build the HTTP-backed context described by `settings`.
    pub(crate) fn connect(settings: &ClientSettings, output: OutputFormat) -> CliResult<Self> {
        let store = HttpAccountStore::from_settings(settings).map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context("failed to build HTTP client"))
        })?;
        Ok(Self::with_store(Arc::new(store), settings, output))
    }

    /// Build a context over an arbitrary account store.
    pub(crate) fn with_store(
        store: Arc<dyn AccountStore>,
        settings: &ClientSettings,
        output: OutputFormat,
    ) -> Self {
        let identity = settings.user_id.clone().map(OwnerId::new);
        Self {
            session: Session::with_identity(store, settings.endpoint.clone(), identity),
            output,
        }
    }
}
