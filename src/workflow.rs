use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Position of a submission in the review pipeline.
///
/// The happy path is strictly linear, ending in `Approved`. `Rejected` can be
/// reached from any status that is not already terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    ForwardedToPio,
    AcceptedByPio,
    ForwardedToExternal,
    UnderExternalReview,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown submission status `{0}`")]
pub struct UnknownStatus(pub String);

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        SubmissionStatus::ForwardedToPio,
        SubmissionStatus::AcceptedByPio,
        SubmissionStatus::ForwardedToExternal,
        SubmissionStatus::UnderExternalReview,
        SubmissionStatus::Approved,
        SubmissionStatus::Rejected,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::ForwardedToPio => "forwarded_to_pio",
            SubmissionStatus::AcceptedByPio => "accepted_by_pio",
            SubmissionStatus::ForwardedToExternal => "forwarded_to_external",
            SubmissionStatus::UnderExternalReview => "under_external_review",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::ForwardedToPio => "Forwarded to PIO",
            SubmissionStatus::AcceptedByPio => "Accepted by PIO",
            SubmissionStatus::ForwardedToExternal => "Forwarded to External",
            SubmissionStatus::UnderExternalReview => "Under External Review",
            SubmissionStatus::Approved => "Approved",
            SubmissionStatus::Rejected => "Rejected",
        }
    }

    /// The next step on the approval path, if any.
    pub fn next(self) -> Option<SubmissionStatus> {
        match self {
            SubmissionStatus::ForwardedToPio => Some(SubmissionStatus::AcceptedByPio),
            SubmissionStatus::AcceptedByPio => Some(SubmissionStatus::ForwardedToExternal),
            SubmissionStatus::ForwardedToExternal => Some(SubmissionStatus::UnderExternalReview),
            SubmissionStatus::UnderExternalReview => Some(SubmissionStatus::Approved),
            SubmissionStatus::Approved | SubmissionStatus::Rejected => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }

    pub fn can_transition_to(self, target: SubmissionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == SubmissionStatus::Rejected || self.next() == Some(target)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for SubmissionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
