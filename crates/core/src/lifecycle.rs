//! Complaint lifecycle rules.
//!
//! Report status graph:
//!
//! ```text
//! pending --(assignment accepted)--> investigating
//! investigating --> resolved
//! investigating --> closed
//! resolved --> closed
//! ```
//!
//! `closed` is terminal and self-loops are not edges. Assignments move
//! `pending -> accepted | rejected` exactly once.

use std::str::FromStr;

use crimewatch_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub use crimewatch_db::entities::{
    complaint_assignment::AssignmentStatus, crime_report::ReportStatus,
};

/// An authority's answer to an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentDecision {
    /// Take the complaint and start investigating
    Accept,
    /// Hand the complaint back for re-routing
    Reject,
}

impl AssignmentDecision {
    /// Assignment status the decision leads to.
    #[must_use]
    pub const fn target_status(self) -> AssignmentStatus {
        match self {
            Self::Accept => AssignmentStatus::Accepted,
            Self::Reject => AssignmentStatus::Rejected,
        }
    }

    /// Report transition applied together with the decision, if any.
    ///
    /// Accepting starts the investigation; rejecting leaves the report
    /// pending so it can be routed again.
    #[must_use]
    pub const fn report_transition(self) -> Option<(ReportStatus, ReportStatus)> {
        match self {
            Self::Accept => Some((ReportStatus::Pending, ReportStatus::Investigating)),
            Self::Reject => None,
        }
    }
}

impl FromStr for AssignmentDecision {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::Validation(format!(
                "Invalid action '{other}'. Must be accept or reject"
            ))),
        }
    }
}

/// Fail with `InvalidTransition` unless `from -> to` is an edge of the graph.
pub fn check_report_transition(from: ReportStatus, to: ReportStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(from, to))
    }
}

/// Parse a client-supplied status string.
pub fn parse_report_status(raw: &str) -> AppResult<ReportStatus> {
    raw.parse::<ReportStatus>().map_err(AppError::Validation)
}

/// Parse a client-supplied assignment status filter.
pub fn parse_assignment_status(raw: &str) -> AppResult<AssignmentStatus> {
    raw.parse::<AssignmentStatus>().map_err(AppError::Validation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    const EDGES: [(ReportStatus, ReportStatus); 4] = [
        (ReportStatus::Pending, ReportStatus::Investigating),
        (ReportStatus::Investigating, ReportStatus::Resolved),
        (ReportStatus::Investigating, ReportStatus::Closed),
        (ReportStatus::Resolved, ReportStatus::Closed),
    ];

    #[test]
    fn test_only_listed_edges_are_allowed() {
        for from in ReportStatus::iter() {
            for to in ReportStatus::iter() {
                let expected = EDGES.contains(&(from, to));
                assert_eq!(
                    check_report_transition(from, to).is_ok(),
                    expected,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(ReportStatus::Closed.is_terminal());
        assert!(ReportStatus::Closed.successors().is_empty());
        for to in ReportStatus::iter() {
            assert!(matches!(
                check_report_transition(ReportStatus::Closed, to),
                Err(AppError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_pending_to_resolved_is_rejected() {
        let err = check_report_transition(ReportStatus::Pending, ReportStatus::Resolved)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid status transition: pending -> resolved");
    }

    #[test]
    fn test_reopening_is_rejected() {
        assert!(check_report_transition(ReportStatus::Resolved, ReportStatus::Investigating).is_err());
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(
            AssignmentDecision::Accept.target_status(),
            AssignmentStatus::Accepted
        );
        assert_eq!(
            AssignmentDecision::Reject.target_status(),
            AssignmentStatus::Rejected
        );
        assert_eq!(
            AssignmentDecision::Accept.report_transition(),
            Some((ReportStatus::Pending, ReportStatus::Investigating))
        );
        assert!(AssignmentDecision::Reject.report_transition().is_none());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!("Accept".parse::<AssignmentDecision>().unwrap(), AssignmentDecision::Accept);
        assert!("maybe".parse::<AssignmentDecision>().is_err());
        assert_eq!(parse_report_status(" Resolved ").unwrap(), ReportStatus::Resolved);
        assert!(matches!(parse_report_status("reopened"), Err(AppError::Validation(_))));
        assert_eq!(parse_assignment_status("rejected").unwrap(), AssignmentStatus::Rejected);
    }
}
