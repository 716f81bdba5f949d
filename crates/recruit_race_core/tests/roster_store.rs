use chrono::NaiveDate;
use recruit_race_core::{
    campaign_score, BlobStore, CampaignWindow, ConfigStore, CoreSettings, FixedClock,
    LedgerStore, MemoryBlobStore, RepoError, RosterRepository, StoreError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn repo(store: &MemoryBlobStore) -> RosterRepository<&MemoryBlobStore, FixedClock> {
    RosterRepository::new(
        store,
        FixedClock::at_noon(date(2025, 11, 18)),
        &CoreSettings::default(),
    )
    .with_rng_seed(42)
}

#[test]
fn empty_store_seeds_fixed_roster_inside_window() {
    let store = MemoryBlobStore::new();
    let repo = repo(&store);

    let roster = repo.all().unwrap();
    assert_eq!(roster.len(), 10);
    assert_eq!(roster[0].id, "recruiter-0");
    assert_eq!(roster[0].display_name, "Alice Chen");
    assert_eq!(roster[9].display_name, "Jessica Wu");

    let window = repo.config().window().unwrap();
    assert_eq!(window, CampaignWindow::new(date(2025, 11, 1), date(2025, 11, 30)));
    for ledger in &roster {
        assert!((5..=44).contains(&ledger.record_count()));
        assert_eq!(ledger.group_label, "Talent Team");
        assert_eq!(campaign_score(ledger, &window), ledger.record_count());
    }
}

#[test]
fn seeded_roster_is_persisted_and_reproducible_across_reads() {
    let store = MemoryBlobStore::new();
    let repo = repo(&store);

    let first = repo.all().unwrap();
    let second = repo.all().unwrap();
    assert_eq!(first, second);
    assert!(store
        .get(&CoreSettings::default().roster_key)
        .unwrap()
        .is_some());
}

#[test]
fn create_appends_empty_ledger_with_unique_id() {
    let store = MemoryBlobStore::new();
    let repo = repo(&store);

    let first = repo.create("  Kara Thrace ").unwrap();
    let second = repo.create("Kara Thrace").unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(first.display_name, "Kara Thrace");
    assert!(first.records.is_empty());
    assert_eq!(first.manual_weekly_counter, 0);
    assert!(first.avatar_ref.ends_with("seed=Kara%20Thrace"));

    let roster = repo.all().unwrap();
    assert_eq!(roster.len(), 12);
    assert_eq!(roster[10].id, first.id);
    assert_eq!(roster[11].id, second.id);
}

#[test]
fn create_rejects_blank_name() {
    let store = MemoryBlobStore::new();
    let err = repo(&store).create("   ").unwrap_err();
    assert!(matches!(err, RepoError::BlankName));
}

#[test]
fn rename_updates_name_and_avatar_or_reports_missing() {
    let store = MemoryBlobStore::new();
    let repo = repo(&store);
    let before = repo.get("recruiter-1").unwrap().unwrap();

    assert!(repo.rename("recruiter-1", "Robert Smith").unwrap());
    let after = repo.get("recruiter-1").unwrap().unwrap();
    assert_eq!(after.display_name, "Robert Smith");
    assert!(after.avatar_ref.ends_with("seed=Robert%20Smith"));
    assert_eq!(after.records, before.records);

    assert!(!repo.rename("recruiter-missing", "Nobody").unwrap());
}

#[test]
fn weekly_counter_update_touches_only_target() {
    let store = MemoryBlobStore::new();
    let repo = repo(&store);

    assert!(repo.update_weekly_counter("recruiter-2", 17).unwrap());
    assert!(!repo.update_weekly_counter("nope", 3).unwrap());

    let roster = repo.all().unwrap();
    for ledger in roster {
        let expected = if ledger.id == "recruiter-2" { 17 } else { 0 };
        assert_eq!(ledger.manual_weekly_counter, expected);
    }
}

#[test]
fn legacy_blob_without_weekly_count_loads_with_zero() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default();
    store
        .set(
            &settings.roster_key,
            r#"[{
                "id": "recruiter-0",
                "name": "Alice Chen",
                "avatar": "https://api.dicebear.com/7.x/avataaars/svg?seed=Alice Chen",
                "applicants": [{
                    "id": "app-recruiter-0-0",
                    "email": "candidate0@example.com",
                    "name": "Candidate 0",
                    "appliedDate": "2025-11-03T10:15:00.000Z",
                    "source": "LinkedIn"
                }],
                "company": "Talent Team",
                "isBot": false
            }]"#,
        )
        .unwrap();

    let roster = repo(&store).all().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].manual_weekly_counter, 0);
    assert_eq!(roster[0].records.len(), 1);
}

#[test]
fn malformed_roster_blob_is_reseeded() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default();
    store.set(&settings.roster_key, "{\"oops\": true}").unwrap();

    let roster = repo(&store).all().unwrap();
    assert_eq!(roster.len(), 10);
}

#[test]
fn reseed_replaces_custom_participants() {
    let store = MemoryBlobStore::new();
    let repo = repo(&store);
    repo.create("Temp Person").unwrap();
    assert_eq!(repo.all().unwrap().len(), 11);

    let reseeded = repo.reseed().unwrap();
    assert_eq!(reseeded.len(), 10);
    assert_eq!(repo.all().unwrap(), reseeded);
}

#[test]
fn failed_write_surfaces_and_leaves_roster_unchanged() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default().with_seed_names(["Solo"]);
    let repo = RosterRepository::new(
        &store,
        FixedClock::at_noon(date(2025, 11, 18)),
        &settings,
    );
    let seeded = repo.all().unwrap();

    let quota_store = MemoryBlobStore::with_quota(1);
    let failing = RosterRepository::new(
        &quota_store,
        FixedClock::at_noon(date(2025, 11, 18)),
        &settings,
    );
    let err = failing.all().unwrap_err();
    assert!(matches!(
        err,
        RepoError::Store(StoreError::WriteRejected { .. })
    ));

    assert_eq!(repo.all().unwrap(), seeded);
}
