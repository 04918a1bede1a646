//! Tagging strategies for the two container lifecycle modes.
//!
//! The creation path is shared; what differs between modes is the label set
//! attached at create time. Ephemeral containers carry a session identifier
//! an external reaper watches, standalone containers do not.

use std::collections::BTreeMap;

use uuid::Uuid;

use dbrig_common::constants::{LABEL_LIFECYCLE, LABEL_MANAGED, LABEL_SESSION};
use dbrig_common::types::LifecycleMode;

/// Decides which labels a new container is created with.
pub trait TaggingStrategy: Send + Sync {
    /// The lifecycle mode this strategy implements.
    fn mode(&self) -> LifecycleMode;

    /// Labels to attach at create time.
    fn labels(&self) -> BTreeMap<String, String>;
}

/// Tags containers with a session identifier so the external reaper removes
/// them when the owning process exits.
#[derive(Debug)]
pub struct EphemeralTagging {
    session_id: Uuid,
}

impl EphemeralTagging {
    /// Creates a strategy with a fresh session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
        }
    }

    /// Creates a strategy joining an existing session.
    #[must_use]
    pub const fn with_session(session_id: Uuid) -> Self {
        Self { session_id }
    }

    /// The session identifier containers are tagged with.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Default for EphemeralTagging {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggingStrategy for EphemeralTagging {
    fn mode(&self) -> LifecycleMode {
        LifecycleMode::Ephemeral
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = base_labels(LifecycleMode::Ephemeral);
        let _ = labels.insert(LABEL_SESSION.to_string(), self.session_id.to_string());
        labels
    }
}

/// Creates containers untagged for reaping; they persist until explicitly
/// removed.
#[derive(Debug, Default)]
pub struct StandaloneTagging;

impl TaggingStrategy for StandaloneTagging {
    fn mode(&self) -> LifecycleMode {
        LifecycleMode::Standalone
    }

    fn labels(&self) -> BTreeMap<String, String> {
        base_labels(LifecycleMode::Standalone)
    }
}

/// Returns the strategy for a lifecycle mode. Ephemeral strategies get a
/// fresh session identifier.
#[must_use]
pub fn for_mode(mode: LifecycleMode) -> Box<dyn TaggingStrategy> {
    match mode {
        LifecycleMode::Ephemeral => Box::new(EphemeralTagging::new()),
        LifecycleMode::Standalone => Box::new(StandaloneTagging),
    }
}

fn base_labels(mode: LifecycleMode) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    let _ = labels.insert(LABEL_MANAGED.to_string(), "true".to_string());
    let _ = labels.insert(LABEL_LIFECYCLE.to_string(), mode.to_string());
    labels
}
