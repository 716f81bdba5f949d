//! Participant ledger store.
//!
//! # Responsibility
//! - Persist the roster as one JSON blob and seed it on first read.
//! - Provide the named roster mutations: create, rename, weekly counter,
//!   record replacement and explicit reseed.
//!
//! # Invariants
//! - Every mutation is read-full-roster -> mutate-one-entry -> write-full-roster.
//! - Unknown participant ids never mutate state.
//! - Created participant ids are unique within the roster.

use crate::clock::Clock;
use crate::model::applicant::ApplicantRecord;
use crate::model::participant::{ParticipantLedger, Roster};
use crate::repo::blob_store::BlobStore;
use crate::repo::config_repo::{ConfigRepository, ConfigStore};
use crate::repo::seed::{seed_roster_in, SeedPlan};
use crate::repo::{RepoError, RepoResult};
use crate::settings::CoreSettings;
use chrono::Local;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use uuid::Uuid;

/// Contract of the ledger store.
pub trait LedgerStore {
    /// Returns every ledger in stored order, seeding the roster when empty.
    fn all(&self) -> RepoResult<Roster>;
    /// Returns one ledger by id.
    fn get(&self, id: &str) -> RepoResult<Option<ParticipantLedger>>;
    /// Appends a new participant with an empty ledger.
    fn create(&self, display_name: &str) -> RepoResult<ParticipantLedger>;
    /// Renames a participant. Returns `false` when `id` is unknown.
    fn rename(&self, id: &str, display_name: &str) -> RepoResult<bool>;
    /// Sets the manual weekly counter. Returns `false` when `id` is unknown.
    fn update_weekly_counter(&self, id: &str, count: i64) -> RepoResult<bool>;
    /// Runs `mutate` against one participant's records inside a single
    /// read-modify-write; the roster is written only when `mutate` returns
    /// `true`. Returns the resulting ledger, or `None` when `id` is unknown.
    fn mutate_records(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Vec<ApplicantRecord>) -> bool,
    ) -> RepoResult<Option<ParticipantLedger>>;
    /// Replaces the whole roster with a freshly seeded one.
    fn reseed(&self) -> RepoResult<Roster>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for &T {
    fn all(&self) -> RepoResult<Roster> {
        (**self).all()
    }

    fn get(&self, id: &str) -> RepoResult<Option<ParticipantLedger>> {
        (**self).get(id)
    }

    fn create(&self, display_name: &str) -> RepoResult<ParticipantLedger> {
        (**self).create(display_name)
    }

    fn rename(&self, id: &str, display_name: &str) -> RepoResult<bool> {
        (**self).rename(id, display_name)
    }

    fn update_weekly_counter(&self, id: &str, count: i64) -> RepoResult<bool> {
        (**self).update_weekly_counter(id, count)
    }

    fn mutate_records(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Vec<ApplicantRecord>) -> bool,
    ) -> RepoResult<Option<ParticipantLedger>> {
        (**self).mutate_records(id, mutate)
    }

    fn reseed(&self) -> RepoResult<Roster> {
        (**self).reseed()
    }
}

/// Blob-backed roster store.
///
/// Seeding reads the campaign window through its own [`ConfigRepository`]
/// over the same blob store.
pub struct RosterRepository<S: BlobStore, C: Clock> {
    store: S,
    config: ConfigRepository<S, C>,
    key: String,
    plan: SeedPlan,
    rng: RefCell<StdRng>,
}

impl<S: BlobStore + Clone, C: Clock> RosterRepository<S, C> {
    pub fn new(store: S, clock: C, settings: &CoreSettings) -> Self {
        Self {
            config: ConfigRepository::new(store.clone(), clock, settings),
            store,
            key: settings.roster_key.clone(),
            plan: SeedPlan {
                names: settings.seed_names.clone(),
                record_range: settings.seed_record_range.clone(),
                group_label: settings.group_label.clone(),
            },
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }
}

impl<S: BlobStore, C: Clock> RosterRepository<S, C> {
    /// Makes seeding reproducible.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        self.rng.replace(StdRng::seed_from_u64(seed));
        self
    }

    /// Config store sharing this repository's blob store and clock.
    pub fn config(&self) -> &ConfigRepository<S, C> {
        &self.config
    }

    fn load(&self) -> RepoResult<Roster> {
        let Some(raw) = self.store.get(&self.key)? else {
            return self.seed_and_save();
        };
        match serde_json::from_str::<Roster>(&raw) {
            Ok(roster) => Ok(roster),
            Err(err) => {
                warn!(
                    "event=roster_load module=repo status=malformed action=reseed error={err}"
                );
                self.seed_and_save()
            }
        }
    }

    fn seed_and_save(&self) -> RepoResult<Roster> {
        let window = self.config.window()?;
        let roster = seed_roster_in(&self.plan, &window, &mut *self.rng.borrow_mut(), &Local);
        self.save(&roster)?;
        info!(
            "event=roster_seed module=repo status=ok participants={} records={}",
            roster.len(),
            roster.iter().map(ParticipantLedger::record_count).sum::<usize>()
        );
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> RepoResult<()> {
        let encoded = serde_json::to_string(roster)?;
        self.store.set(&self.key, &encoded)?;
        Ok(())
    }

    fn update_one(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut ParticipantLedger) -> bool,
    ) -> RepoResult<Option<ParticipantLedger>> {
        let mut roster = self.load()?;
        let Some(ledger) = roster.iter_mut().find(|ledger| ledger.id == id) else {
            return Ok(None);
        };
        let changed = mutate(ledger);
        let snapshot = ledger.clone();
        if changed {
            self.save(&roster)?;
        }
        Ok(Some(snapshot))
    }
}

impl<S: BlobStore, C: Clock> LedgerStore for RosterRepository<S, C> {
    fn all(&self) -> RepoResult<Roster> {
        self.load()
    }

    fn get(&self, id: &str) -> RepoResult<Option<ParticipantLedger>> {
        Ok(self.load()?.into_iter().find(|ledger| ledger.id == id))
    }

    fn create(&self, display_name: &str) -> RepoResult<ParticipantLedger> {
        let display_name = normalize_display_name(display_name)?;
        let mut roster = self.load()?;

        let mut id = format!("recruiter-{}", Uuid::new_v4());
        while roster.iter().any(|ledger| ledger.id == id) {
            id = format!("recruiter-{}", Uuid::new_v4());
        }

        let mut ledger = ParticipantLedger::new(id, display_name);
        ledger.group_label = self.plan.group_label.clone();
        roster.push(ledger.clone());
        self.save(&roster)?;

        info!(
            "event=participant_create module=repo status=ok participant_id={}",
            ledger.id
        );
        Ok(ledger)
    }

    fn rename(&self, id: &str, display_name: &str) -> RepoResult<bool> {
        let display_name = normalize_display_name(display_name)?;
        let renamed = self.update_one(id, |ledger| {
            ledger.rename(display_name);
            true
        })?;
        Ok(renamed.is_some())
    }

    fn update_weekly_counter(&self, id: &str, count: i64) -> RepoResult<bool> {
        let updated = self.update_one(id, |ledger| {
            ledger.manual_weekly_counter = count;
            true
        })?;
        Ok(updated.is_some())
    }

    fn mutate_records(
        &self,
        id: &str,
        mutate: &mut dyn FnMut(&mut Vec<ApplicantRecord>) -> bool,
    ) -> RepoResult<Option<ParticipantLedger>> {
        self.update_one(id, |ledger| mutate(&mut ledger.records))
    }

    fn reseed(&self) -> RepoResult<Roster> {
        warn!("event=roster_reseed module=repo status=start");
        self.seed_and_save()
    }
}

fn normalize_display_name(value: &str) -> RepoResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepoError::BlankName);
    }
    Ok(trimmed.to_string())
}
