//! Campaign window store.
//!
//! # Responsibility
//! - Load the persisted campaign window or derive and persist the current
//!   month as default.
//! - Persist caller-supplied windows under the configured window policy.
//!
//! # Invariants
//! - `window()` is idempotent absent an intervening `set_window()`.
//! - A malformed config blob is replaced by the month default.
//! - Under `WindowPolicy::AcceptAsIs` windows are persisted verbatim.

use crate::clock::Clock;
use crate::model::window::{CampaignWindow, WindowPolicy};
use crate::repo::blob_store::BlobStore;
use crate::repo::RepoResult;
use crate::settings::CoreSettings;
use log::{info, warn};

/// Contract of the campaign window store.
pub trait ConfigStore {
    /// Returns the active window, persisting the default when absent.
    fn window(&self) -> RepoResult<CampaignWindow>;
    /// Persists `window` and returns what was actually stored.
    fn set_window(&self, window: CampaignWindow) -> RepoResult<CampaignWindow>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn window(&self) -> RepoResult<CampaignWindow> {
        (**self).window()
    }

    fn set_window(&self, window: CampaignWindow) -> RepoResult<CampaignWindow> {
        (**self).set_window(window)
    }
}

/// Blob-backed campaign window store.
pub struct ConfigRepository<S: BlobStore, C: Clock> {
    store: S,
    clock: C,
    key: String,
    policy: WindowPolicy,
}

impl<S: BlobStore, C: Clock> ConfigRepository<S, C> {
    pub fn new(store: S, clock: C, settings: &CoreSettings) -> Self {
        Self {
            store,
            clock,
            key: settings.config_key.clone(),
            policy: settings.window_policy,
        }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    fn persist(&self, window: &CampaignWindow) -> RepoResult<()> {
        let encoded = serde_json::to_string(window)?;
        self.store.set(&self.key, &encoded)?;
        Ok(())
    }
}

impl<S: BlobStore, C: Clock> ConfigStore for ConfigRepository<S, C> {
    fn window(&self) -> RepoResult<CampaignWindow> {
        if let Some(raw) = self.store.get(&self.key)? {
            match serde_json::from_str::<CampaignWindow>(&raw) {
                Ok(window) => return Ok(window),
                Err(err) => warn!(
                    "event=config_load module=repo status=malformed action=reset_default error={err}"
                ),
            }
        }

        let window = CampaignWindow::month_of(self.clock.today());
        self.persist(&window)?;
        info!(
            "event=config_default module=repo status=ok start={} end={}",
            window.campaign_start, window.campaign_end
        );
        Ok(window)
    }

    fn set_window(&self, window: CampaignWindow) -> RepoResult<CampaignWindow> {
        let accepted = self.policy.apply(window).inspect_err(|_| {
            warn!("event=config_save module=repo status=rejected reason=inverted_window");
        })?;
        self.persist(&accepted)?;
        info!(
            "event=config_save module=repo status=ok start={} end={} weekly={}",
            accepted.campaign_start,
            accepted.campaign_end,
            accepted.weekly_range().is_some()
        );
        Ok(accepted)
    }
}
