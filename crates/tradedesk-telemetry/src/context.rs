//! Process-level span carrying the running command and build identifier.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the command-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the command-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("tradedesk", command = %command, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}
