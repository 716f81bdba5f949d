//! Explicit viewer context for read models.

/// Who a leaderboard view is being assembled for.
///
/// Passed explicitly into view builders; core keeps no notion of a
/// logged-in participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    /// Sees the aggregate of every ledger.
    Admin,
    /// Sees their own ledger, rank and score.
    Participant(String),
}

impl Viewer {
    /// Returns the participant id when this viewer is a participant.
    pub fn participant_id(&self) -> Option<&str> {
        match self {
            Self::Admin => None,
            Self::Participant(id) => Some(id.as_str()),
        }
    }
}
