//! Coaching tips and portal-count analysis via external text generators.
//!
//! # Responsibility
//! - Wrap an external tip generator behind a timeout and a static fallback.
//! - Pick the canned message for leaders and administrators.
//! - Parse portal-count analysis replies into a typed result.
//!
//! # Invariants
//! - Tip lookup never fails to the caller and never blocks past the timeout.
//! - Score computation never waits on a generator.
//! - Analysis replies are accepted only when they match `PortalAnalysis`.

use crate::model::viewer::Viewer;
use crate::service::scoring::LeaderboardEntry;
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Tip used when no generator is configured.
pub const UNCONFIGURED_TIP: &str = "Keep pushing! You're doing great.";
/// Tip used when the generator fails or times out.
pub const FALLBACK_TIP: &str = "Focus on your unique value proposition to attract more candidates!";
/// Tip used when the generator answers with blank text.
pub const EMPTY_REPLY_TIP: &str = "Compete to win!";
/// Tip shown to the current leader.
pub const LEADER_TIP: &str = "You are in the lead! Keep the momentum going to secure the prize!";
/// Tip shown to administrators.
pub const ADMIN_TIP: &str = "As Admin, ensure all scores are synced daily by 5 PM.";

/// Maximum portal text forwarded to an analyzer, in characters.
pub const PORTAL_TEXT_LIMIT: usize = 10_000;
/// Commission per applicant used when the caller supplies no rate.
pub const DEFAULT_COMMISSION_RATE: u64 = 50;

/// Failure reported by an external text generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorError(pub String);

impl Display for GeneratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "generator failed: {}", self.0)
    }
}

impl Error for GeneratorError {}

/// Summary handed to a tip generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipRequest {
    pub participant_name: String,
    pub participant_score: usize,
    pub leader_name: String,
    pub leader_score: usize,
}

/// External producer of one-sentence coaching tips.
pub trait TipGenerator: Send + Sync {
    fn suggest_tip(&self, request: &TipRequest) -> Result<String, GeneratorError>;
}

/// Tip service with timeout and fallback.
pub struct CoachingService {
    generator: Option<Arc<dyn TipGenerator>>,
    timeout: Duration,
}

impl CoachingService {
    pub fn new(generator: Option<Arc<dyn TipGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Picks the tip for `viewer` from a ranked leaderboard.
    pub fn tip_for(&self, viewer: &Viewer, entries: &[LeaderboardEntry]) -> String {
        let Some(participant_id) = viewer.participant_id() else {
            return ADMIN_TIP.to_string();
        };
        let Some(leader) = entries.first() else {
            return LEADER_TIP.to_string();
        };
        if leader.participant_id == participant_id {
            return LEADER_TIP.to_string();
        }
        let Some(me) = entries
            .iter()
            .find(|entry| entry.participant_id == participant_id)
        else {
            return LEADER_TIP.to_string();
        };

        self.suggest_tip(TipRequest {
            participant_name: me.display_name.clone(),
            participant_score: me.campaign_score,
            leader_name: leader.display_name.clone(),
            leader_score: leader.campaign_score,
        })
    }

    /// Asks the generator for a tip, falling back on error or timeout.
    ///
    /// The generator runs on its own thread; a late reply is discarded.
    pub fn suggest_tip(&self, request: TipRequest) -> String {
        let Some(generator) = self.generator.clone() else {
            return UNCONFIGURED_TIP.to_string();
        };

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("coaching-tip".to_string())
            .spawn(move || {
                let _ = tx.send(generator.suggest_tip(&request));
            });
        if let Err(err) = spawned {
            warn!("event=coaching_tip module=service status=error error_code=spawn_failed error={err}");
            return FALLBACK_TIP.to_string();
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(tip)) if tip.trim().is_empty() => EMPTY_REPLY_TIP.to_string(),
            Ok(Ok(tip)) => {
                info!("event=coaching_tip module=service status=ok");
                tip.trim().to_string()
            }
            Ok(Err(err)) => {
                warn!("event=coaching_tip module=service status=error error_code=generator_failed error={err}");
                FALLBACK_TIP.to_string()
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    "event=coaching_tip module=service status=error error_code=timeout timeout_ms={}",
                    self.timeout.as_millis()
                );
                FALLBACK_TIP.to_string()
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("event=coaching_tip module=service status=error error_code=generator_aborted");
                FALLBACK_TIP.to_string()
            }
        }
    }
}

/// Typed reply of a portal-count analysis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortalAnalysis {
    pub count: u32,
    pub reasoning: String,
}

impl PortalAnalysis {
    /// Commission earned on the counted applicants at `rate_per_applicant`.
    pub fn estimated_commission(&self, rate_per_applicant: u64) -> u64 {
        estimated_commission(u64::from(self.count), rate_per_applicant)
    }
}

/// Commission for `applicants` at `rate_per_applicant`, saturating at
/// `u64::MAX`.
pub fn estimated_commission(applicants: u64, rate_per_applicant: u64) -> u64 {
    applicants.saturating_mul(rate_per_applicant)
}

/// Why a portal analysis could not be used.
#[derive(Debug)]
pub enum AnalysisError {
    Generator(GeneratorError),
    /// Reply did not match `{count, reasoning}`.
    MalformedReply(serde_json::Error),
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generator(err) => write!(f, "{err}"),
            Self::MalformedReply(err) => write!(f, "malformed analysis reply: {err}"),
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Generator(err) => Some(err),
            Self::MalformedReply(err) => Some(err),
        }
    }
}

/// External analyzer that counts applicants in pasted portal text.
///
/// Replies with JSON text shaped like `{"count": 12, "reasoning": "..."}`.
pub trait PortalAnalyzer {
    fn analyze(&self, portal_text: &str) -> Result<String, GeneratorError>;
}

/// Parses an analyzer reply, tolerating a surrounding markdown code fence.
pub fn parse_portal_analysis(reply: &str) -> Result<PortalAnalysis, AnalysisError> {
    let body = strip_code_fence(reply.trim());
    serde_json::from_str::<PortalAnalysis>(body).map_err(AnalysisError::MalformedReply)
}

/// Sends at most [`PORTAL_TEXT_LIMIT`] characters to `analyzer` and parses
/// the reply.
pub fn analyze_portal_text(
    analyzer: &dyn PortalAnalyzer,
    portal_text: &str,
) -> Result<PortalAnalysis, AnalysisError> {
    let excerpt = portal_text
        .chars()
        .take(PORTAL_TEXT_LIMIT)
        .collect::<String>();
    let reply = analyzer
        .analyze(&excerpt)
        .map_err(AnalysisError::Generator)?;
    parse_portal_analysis(&reply).inspect_err(|err| {
        warn!("event=portal_analysis module=service status=error error={err}");
    })
}

fn strip_code_fence(value: &str) -> &str {
    let Some(rest) = value.strip_prefix("```") else {
        return value;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::{
        estimated_commission, parse_portal_analysis, strip_code_fence, AnalysisError,
        DEFAULT_COMMISSION_RATE,
    };

    #[test]
    fn strips_fenced_json() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parses_typed_reply_and_rejects_other_shapes() {
        let parsed = parse_portal_analysis(r#"{"count": 45, "reasoning": "Total: 45"}"#).unwrap();
        assert_eq!(parsed.count, 45);
        assert_eq!(parsed.reasoning, "Total: 45");

        assert_eq!(parsed.estimated_commission(DEFAULT_COMMISSION_RATE), 2_250);

        for bad in [
            "[]",
            r#"{"count": "many", "reasoning": "x"}"#,
            r#"{"count": -1, "reasoning": "x"}"#,
            r#"{"reasoning": "x"}"#,
            "not json",
        ] {
            assert!(matches!(
                parse_portal_analysis(bad),
                Err(AnalysisError::MalformedReply(_))
            ));
        }
    }

    #[test]
    fn commission_multiplies_and_saturates() {
        assert_eq!(estimated_commission(12, 50), 600);
        assert_eq!(estimated_commission(0, 50), 0);
        assert_eq!(estimated_commission(u64::MAX, 2), u64::MAX);
    }
}
