//! No-op update backend for platforms without a native updater.

use std::sync::Arc;

use super::{Capability, CheckerHandle, FeedSettings, UpdateBackend};
use crate::error::{Result, UpdaterError};
use crate::events::UpdateEvents;

/// Stub backend that never contacts a checker.
///
/// Used on platforms where no auto-update framework is bundled (Linux,
/// Windows, etc.). It reports [`Capability::Unavailable`], so the manager
/// never asks it for a checker; a direct call returns an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubBackend;

impl UpdateBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn capability(&self) -> Capability {
        Capability::Unavailable
    }

    fn create_checker(
        &self,
        _feed: &FeedSettings,
        _events: Arc<dyn UpdateEvents>,
    ) -> Result<Box<dyn CheckerHandle>> {
        Err(UpdaterError::Backend(
            "automatic updates are not supported on this platform".to_owned(),
        ))
    }
}
