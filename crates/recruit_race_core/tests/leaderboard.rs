use chrono::{NaiveDate, Utc};
use recruit_race_core::clock::noon_in;
use recruit_race_core::{
    leaderboard_in, rank_of, total_campaign_score, ApplicantRecord, CampaignWindow, ConfigStore,
    CoreSettings, FixedClock, LeaderboardService, LedgerStore, MemoryBlobStore,
    ParticipantLedger, RosterRepository, ServiceError, Viewer,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger(id: &str, name: &str, days: &[u32]) -> ParticipantLedger {
    let mut ledger = ParticipantLedger::new(id, name);
    ledger.records = days
        .iter()
        .enumerate()
        .map(|(idx, day)| ApplicantRecord {
            id: format!("app-{id}-{idx}"),
            email: format!("candidate{idx}@example.com"),
            name: format!("Candidate {idx}"),
            applied_at: noon_in(date(2025, 11, *day), &Utc),
            source: "LinkedIn".to_string(),
        })
        .collect();
    ledger
}

fn november() -> CampaignWindow {
    CampaignWindow::new(date(2025, 11, 1), date(2025, 11, 30))
}

#[test]
fn ranks_by_campaign_score_with_stable_ties() {
    let roster = vec![
        ledger("a", "Alice", &[1, 2]),
        ledger("b", "Bob", &[3, 4, 5]),
        ledger("c", "Charlie", &[6, 7]),
        ledger("d", "Diana", &[]),
    ];
    let entries = leaderboard_in(&roster, &november(), &Utc);

    let order = entries
        .iter()
        .map(|entry| (entry.rank, entry.participant_id.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(order, vec![(1, "b"), (2, "a"), (3, "c"), (4, "d")]);
    assert_eq!(rank_of(&entries, "c"), Some(3));
    assert_eq!(rank_of(&entries, "zzz"), None);
    assert_eq!(total_campaign_score(&entries), 7);
}

#[test]
fn out_of_window_records_do_not_affect_rank() {
    let mut late = ledger("late", "Late", &[]);
    late.records.extend(ledger("x", "X", &[1, 2, 3]).records);
    for record in &mut late.records {
        record.applied_at = noon_in(date(2025, 12, 2), &Utc);
    }
    let roster = vec![late, ledger("on", "OnTime", &[9])];

    let entries = leaderboard_in(&roster, &november(), &Utc);
    assert_eq!(entries[0].participant_id, "on");
    assert_eq!(entries[1].campaign_score, 0);
}

#[test]
fn dashboard_scopes_chart_to_viewer() {
    let store = MemoryBlobStore::new();
    let clock = FixedClock::at_noon(date(2025, 11, 18));
    let settings = CoreSettings::default()
        .with_seed_names(["Alice Chen", "Bob Smith", "Charlie Davis"])
        .with_seed_record_range(6, 12);
    let ledgers = RosterRepository::new(&store, clock, &settings).with_rng_seed(3);
    let service = LeaderboardService::new(ledgers.config(), &ledgers);

    let admin = service.dashboard_in(&Viewer::Admin, &Utc).unwrap();
    assert_eq!(admin.entries.len(), 3);
    assert!(admin.viewer_entry.is_none());
    assert_eq!(admin.series.len(), 30);
    let aggregate = admin.series.iter().map(|bucket| bucket.count).sum::<usize>();
    assert_eq!(aggregate, admin.total_campaign_applicants);
    assert_eq!(admin.window, ledgers.config().window().unwrap());

    let viewer = Viewer::Participant("recruiter-1".to_string());
    let personal = service.dashboard_in(&viewer, &Utc).unwrap();
    let own = personal.viewer_entry.clone().unwrap();
    assert_eq!(own.participant_id, "recruiter-1");
    let own_total = personal.series.iter().map(|bucket| bucket.count).sum::<usize>();
    assert_eq!(own_total, own.campaign_score);
    assert_eq!(personal.entries, admin.entries);
}

#[test]
fn dashboard_rejects_unknown_participant() {
    let store = MemoryBlobStore::new();
    let clock = FixedClock::at_noon(date(2025, 11, 18));
    let ledgers =
        RosterRepository::new(&store, clock, &CoreSettings::default()).with_rng_seed(1);
    let service = LeaderboardService::new(ledgers.config(), &ledgers);

    let err = service
        .dashboard(&Viewer::Participant("recruiter-ghost".to_string()))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ParticipantNotFound(_)));
    assert_eq!(ledgers.all().unwrap().len(), 10);
}
