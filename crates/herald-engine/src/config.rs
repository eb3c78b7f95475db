use serde::{Deserialize, Serialize};

use herald_core::{BatchConfig, NotificationPriority};

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Global kill switch; when false every send is skipped and reported
    /// as unsuccessful without reaching the transport.
    pub enabled: bool,

    /// Priority applied when a notification config carries none.
    pub default_priority: NotificationPriority,

    /// Scheduler tick interval in seconds.
    pub tick_interval_secs: u64,

    /// Default batching used when the caller does not override it.
    pub batch: BatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_priority: NotificationPriority::Normal,
            tick_interval_secs: 60,
            batch: BatchConfig::default(),
        }
    }
}
