use recruit_race_core::service::coaching::{
    ADMIN_TIP, EMPTY_REPLY_TIP, FALLBACK_TIP, LEADER_TIP, PORTAL_TEXT_LIMIT, UNCONFIGURED_TIP,
};
use recruit_race_core::{
    analyze_portal_text, AnalysisError, CoachingService, GeneratorError, LeaderboardEntry,
    PortalAnalyzer, TipGenerator, TipRequest, Viewer,
};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

struct Canned(Result<String, GeneratorError>);

impl TipGenerator for Canned {
    fn suggest_tip(&self, _request: &TipRequest) -> Result<String, GeneratorError> {
        self.0.clone()
    }
}

#[derive(Default)]
struct Recording(Mutex<Vec<TipRequest>>);

impl TipGenerator for Recording {
    fn suggest_tip(&self, request: &TipRequest) -> Result<String, GeneratorError> {
        self.0.lock().unwrap().push(request.clone());
        Ok("  Call three past applicants today.  ".to_string())
    }
}

struct Slow;

impl TipGenerator for Slow {
    fn suggest_tip(&self, _request: &TipRequest) -> Result<String, GeneratorError> {
        thread::sleep(Duration::from_millis(500));
        Ok("too late".to_string())
    }
}

fn entry(rank: usize, id: &str, name: &str, score: usize) -> LeaderboardEntry {
    LeaderboardEntry {
        rank,
        participant_id: id.to_string(),
        display_name: name.to_string(),
        avatar_ref: String::new(),
        group_label: "Talent Team".to_string(),
        campaign_score: score,
        weekly_score: 0,
        manual_weekly_counter: 0,
    }
}

fn board() -> Vec<LeaderboardEntry> {
    vec![
        entry(1, "recruiter-0", "Alice Chen", 30),
        entry(2, "recruiter-1", "Bob Smith", 12),
    ]
}

fn service(generator: impl TipGenerator + 'static) -> CoachingService {
    let generator: Arc<dyn TipGenerator> = Arc::new(generator);
    CoachingService::new(Some(generator), Duration::from_secs(2))
}

fn bob() -> Viewer {
    Viewer::Participant("recruiter-1".to_string())
}

#[test]
fn admin_and_leader_get_canned_tips() {
    let generator = Arc::new(Recording::default());
    let shared: Arc<dyn TipGenerator> = generator.clone();
    let service = CoachingService::new(Some(shared), Duration::from_secs(2));

    assert_eq!(service.tip_for(&Viewer::Admin, &board()), ADMIN_TIP);
    assert_eq!(
        service.tip_for(&Viewer::Participant("recruiter-0".to_string()), &board()),
        LEADER_TIP
    );
    assert!(generator.0.lock().unwrap().is_empty());
}

#[test]
fn trailing_participant_asks_generator_with_leader_context() {
    let generator = Arc::new(Recording::default());
    let shared: Arc<dyn TipGenerator> = generator.clone();
    let service = CoachingService::new(Some(shared), Duration::from_secs(2));

    let tip = service.tip_for(&bob(), &board());
    assert_eq!(tip, "Call three past applicants today.");

    let requests = generator.0.lock().unwrap();
    assert_eq!(
        requests.as_slice(),
        &[TipRequest {
            participant_name: "Bob Smith".to_string(),
            participant_score: 12,
            leader_name: "Alice Chen".to_string(),
            leader_score: 30,
        }]
    );
}

#[test]
fn missing_generator_uses_unconfigured_tip() {
    let service = CoachingService::new(None, Duration::from_secs(2));
    assert_eq!(service.tip_for(&bob(), &board()), UNCONFIGURED_TIP);
}

#[test]
fn generator_failure_falls_back() {
    let service = service(Canned(Err(GeneratorError("quota".to_string()))));
    assert_eq!(service.tip_for(&bob(), &board()), FALLBACK_TIP);
}

#[test]
fn blank_reply_uses_default_tip() {
    let service = service(Canned(Ok("   ".to_string())));
    assert_eq!(service.tip_for(&bob(), &board()), EMPTY_REPLY_TIP);
}

#[test]
fn slow_generator_times_out_to_fallback() {
    let slow: Arc<dyn TipGenerator> = Arc::new(Slow);
    let service = CoachingService::new(Some(slow), Duration::from_millis(20));
    assert_eq!(service.tip_for(&bob(), &board()), FALLBACK_TIP);
}

struct EchoLength(RefCell<usize>);

impl PortalAnalyzer for EchoLength {
    fn analyze(&self, portal_text: &str) -> Result<String, GeneratorError> {
        let length = portal_text.chars().count();
        self.0.replace(length);
        Ok(format!(
            "```json\n{{\"count\": 12, \"reasoning\": \"saw {length} chars\"}}\n```"
        ))
    }
}

struct Garbled;

impl PortalAnalyzer for Garbled {
    fn analyze(&self, _portal_text: &str) -> Result<String, GeneratorError> {
        Ok("Sure! There are about twelve.".to_string())
    }
}

#[test]
fn portal_analysis_truncates_input_and_parses_fenced_reply() {
    let analyzer = EchoLength(RefCell::new(0));
    let text = "x".repeat(PORTAL_TEXT_LIMIT + 500);

    let analysis = analyze_portal_text(&analyzer, &text).unwrap();
    assert_eq!(analysis.count, 12);
    assert_eq!(*analyzer.0.borrow(), PORTAL_TEXT_LIMIT);
    assert_eq!(analysis.reasoning, format!("saw {PORTAL_TEXT_LIMIT} chars"));
}

#[test]
fn portal_analysis_rejects_untyped_reply() {
    let err = analyze_portal_text(&Garbled, "Applicants: 12").unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedReply(_)));
}
