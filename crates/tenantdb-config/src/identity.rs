//! Reloadable identity-auth flags.
//!
//! Holds [`IdentitySettings`] behind an `ArcSwap` so the flags can be read
//! lock-free on every client construction and swapped at runtime. A swap only
//! affects clients constructed afterwards.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::settings::IdentitySettings;

/// Decides between identity-based and key-based authentication.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    inner: Arc<ArcSwap<IdentitySettings>>,
}

impl IdentityConfig {
    pub fn new(settings: IdentitySettings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    /// Both flags off: key-based authentication.
    pub fn disabled() -> Self {
        Self::new(IdentitySettings::default())
    }

    /// `true` when managed identity or workload identity is enabled.
    ///
    /// Evaluated from the current flags on every call, never cached.
    pub fn is_identity_auth_enabled(&self) -> bool {
        self.inner.load().is_identity_enabled()
    }

    /// Snapshot of the current flags.
    pub fn settings(&self) -> IdentitySettings {
        **self.inner.load()
    }

    /// Replace both flags.
    pub fn update(&self, settings: IdentitySettings) {
        info!(
            managed_identity_enabled = settings.managed_identity_enabled,
            workload_identity_enabled = settings.workload_identity_enabled,
            "Identity auth settings updated"
        );
        self.inner.store(Arc::new(settings));
    }

    pub fn set_managed_identity_enabled(&self, enabled: bool) {
        self.inner.rcu(|current| IdentitySettings {
            managed_identity_enabled: enabled,
            ..**current
        });
    }

    pub fn set_workload_identity_enabled(&self, enabled: bool) {
        self.inner.rcu(|current| IdentitySettings {
            workload_identity_enabled: enabled,
            ..**current
        });
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl From<IdentitySettings> for IdentityConfig {
    fn from(settings: IdentitySettings) -> Self {
        Self::new(settings)
    }
}
