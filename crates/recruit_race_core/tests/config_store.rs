use chrono::NaiveDate;
use recruit_race_core::{
    BlobStore, CampaignWindow, ConfigRepository, ConfigStore, CoreSettings, FixedClock,
    MemoryBlobStore, RepoError, StoreError, WindowPolicy,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn clock() -> FixedClock {
    FixedClock::at_noon(date(2025, 11, 18))
}

#[test]
fn missing_config_persists_current_month_default() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default();
    let repo = ConfigRepository::new(&store, clock(), &settings);

    let window = repo.window().unwrap();
    assert_eq!(window, CampaignWindow::new(date(2025, 11, 1), date(2025, 11, 30)));

    let raw = store.get(&settings.config_key).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["startDate"], "2025-11-01");
    assert_eq!(json["endDate"], "2025-11-30");
    assert!(json.get("weeklyStartDate").is_none());

    assert_eq!(repo.window().unwrap(), window);
}

#[test]
fn set_window_persists_verbatim_including_inverted_ranges() {
    let store = MemoryBlobStore::new();
    let repo = ConfigRepository::new(&store, clock(), &CoreSettings::default());

    let inverted = CampaignWindow::new(date(2025, 12, 31), date(2025, 12, 1))
        .with_weekly(Some(date(2025, 12, 8)), Some(date(2025, 12, 14)));
    assert_eq!(repo.set_window(inverted).unwrap(), inverted);
    assert_eq!(repo.window().unwrap(), inverted);
}

#[test]
fn reject_policy_refuses_inverted_window_and_keeps_previous() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default().with_window_policy(WindowPolicy::RejectInverted);
    let repo = ConfigRepository::new(&store, clock(), &settings);
    let before = repo.window().unwrap();

    let inverted = CampaignWindow::new(date(2025, 12, 31), date(2025, 12, 1));
    let err = repo.set_window(inverted).unwrap_err();
    assert!(matches!(err, RepoError::InvalidWindow(_)));
    assert_eq!(repo.window().unwrap(), before);
}

#[test]
fn normalize_policy_swaps_inverted_weekly_bounds() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default().with_window_policy(WindowPolicy::NormalizeInverted);
    let repo = ConfigRepository::new(&store, clock(), &settings);

    let window = CampaignWindow::new(date(2025, 12, 1), date(2025, 12, 31))
        .with_weekly(Some(date(2025, 12, 14)), Some(date(2025, 12, 8)));
    let stored = repo.set_window(window).unwrap();
    assert_eq!(stored.weekly_start, Some(date(2025, 12, 8)));
    assert_eq!(stored.weekly_end, Some(date(2025, 12, 14)));
}

#[test]
fn malformed_config_blob_is_replaced_by_default() {
    let store = MemoryBlobStore::new();
    let settings = CoreSettings::default();
    store.set(&settings.config_key, "{not json").unwrap();
    let repo = ConfigRepository::new(&store, clock(), &settings);

    let window = repo.window().unwrap();
    assert_eq!(window.campaign_start, date(2025, 11, 1));
    let raw = store.get(&settings.config_key).unwrap().unwrap();
    assert!(raw.contains("2025-11-01"));
}

#[test]
fn persistence_failure_surfaces_as_store_error() {
    let store = MemoryBlobStore::with_quota(4);
    let repo = ConfigRepository::new(&store, clock(), &CoreSettings::default());

    let err = repo.window().unwrap_err();
    assert!(matches!(
        err,
        RepoError::Store(StoreError::WriteRejected { .. })
    ));
}
