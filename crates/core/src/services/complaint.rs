//! Complaint service: routing reports to authorities and driving the
//! report/assignment state machine.
//!
//! Every state change runs in one transaction that holds the assignment
//! update, the report update and the audit row. Concurrent writers are
//! serialized with compare-and-set updates; the loser gets `Conflict`.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use crimewatch_common::{AppError, AppResult, IdGenerator, RoutingConfig};
use crimewatch_db::{
    entities::{
        account::{self, AccountRole},
        complaint_assignment::{self, AssignmentStatus},
        crime_report::{self, ReportStatus},
        report_status_event,
    },
    repositories::{
        AccountRepository, ComplaintRepository, CrimeReportRepository, StatusEventRepository,
    },
};
use serde::Serialize;
use tracing::{info, warn};

use crate::lifecycle::{AssignmentDecision, check_report_transition};

/// Longest note an authority may attach to a status update.
pub const MAX_FEEDBACK_LEN: usize = 2000;

/// A new assignment together with the complaint number of its report.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub assignment: complaint_assignment::Model,
    pub complaint_id: String,
}

/// An assignment joined with its report, as shown in complaint queues.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintView {
    pub assignment: complaint_assignment::Model,
    pub report: crime_report::Model,
}

/// Complaint service for business logic.
#[derive(Clone)]
pub struct ComplaintService {
    report_repo: CrimeReportRepository,
    complaint_repo: ComplaintRepository,
    account_repo: AccountRepository,
    event_repo: StatusEventRepository,
    routing: RoutingConfig,
    id_gen: IdGenerator,
}

/// Whether an authority account may be handed a report.
///
/// The authority must be approved and unblocked, its jurisdiction tag must be
/// a prefix of the report's pincode (or `*`), and its department must cover
/// the department the routing table picks for the report's category.
#[must_use]
pub fn is_eligible(
    authority: &account::Model,
    report: &crime_report::Model,
    routing: &RoutingConfig,
) -> bool {
    if !authority.is_active_authority() {
        return false;
    }

    let covers_area = authority
        .jurisdiction
        .as_deref()
        .is_some_and(|tag| tag == "*" || report.pincode.starts_with(tag));

    let wanted = routing.department_for(&report.category).to_lowercase();
    let covers_category = authority
        .department
        .as_deref()
        .is_some_and(|dept| dept.to_lowercase().contains(&wanted));

    covers_area && covers_category
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub const fn new(
        report_repo: CrimeReportRepository,
        complaint_repo: ComplaintRepository,
        account_repo: AccountRepository,
        event_repo: StatusEventRepository,
        routing: RoutingConfig,
    ) -> Self {
        Self {
            report_repo,
            complaint_repo,
            account_repo,
            event_repo,
            routing,
            id_gen: IdGenerator::new(),
        }
    }

    /// Assign a pending report to a specific authority.
    pub async fn assign_complaint(
        &self,
        report_id: &str,
        authority_id: &str,
    ) -> AppResult<AssignmentOutcome> {
        let report = self.report_repo.get_by_id(report_id).await?;
        let authority = self.account_repo.get_by_id(authority_id).await?;

        if !is_eligible(&authority, &report, &self.routing) {
            return Err(AppError::Validation(format!(
                "Authority {authority_id} cannot take complaints for pincode {} ({})",
                report.pincode, report.category
            )));
        }

        self.assign(&report, &authority).await
    }

    /// Route a pending report to the first eligible authority that has not
    /// held it before. `None` when nobody qualifies.
    pub async fn route_report(&self, report_id: &str) -> AppResult<Option<AssignmentOutcome>> {
        let report = self.report_repo.get_by_id(report_id).await?;
        self.route(&report).await
    }

    /// Route an already loaded report.
    pub async fn route(
        &self,
        report: &crime_report::Model,
    ) -> AppResult<Option<AssignmentOutcome>> {
        if report.status != ReportStatus::Pending {
            return Err(AppError::invalid_transition(report.status, "assigned"));
        }

        let history = self.complaint_repo.history_for_report(&report.id).await?;
        if history.iter().any(|a| a.status.is_active()) {
            return Err(AppError::Conflict(format!(
                "Report {} already has an active assignment",
                report.id
            )));
        }
        let tried: HashSet<&str> = history.iter().map(|a| a.authority_id.as_str()).collect();

        let candidate = self
            .account_repo
            .find_active_authorities()
            .await?
            .into_iter()
            .find(|a| !tried.contains(a.id.as_str()) && is_eligible(a, report, &self.routing));

        match candidate {
            Some(authority) => self.assign(report, &authority).await.map(Some),
            None => {
                info!(
                    report = %report.id,
                    pincode = %report.pincode,
                    "No eligible authority for report"
                );
                Ok(None)
            }
        }
    }

    async fn assign(
        &self,
        report: &crime_report::Model,
        authority: &account::Model,
    ) -> AppResult<AssignmentOutcome> {
        let now = Utc::now();
        let txn = self.complaint_repo.begin().await?;

        // Row lock on the report: concurrent assigners queue up here.
        if CrimeReportRepository::touch_pending(&txn, &report.id, now).await? == 0 {
            return Err(AppError::invalid_transition(report.status, "assigned"));
        }

        let existing = ComplaintRepository::find_for_report(&txn, &report.id).await?;
        if existing.iter().any(|a| a.status.is_active()) {
            return Err(AppError::Conflict(format!(
                "Report {} already has an active assignment",
                report.id
            )));
        }
        if existing.iter().any(|a| a.authority_id == authority.id) {
            return Err(AppError::Conflict(format!(
                "Authority {} was already assigned report {}",
                authority.id, report.id
            )));
        }

        let assignment = ComplaintRepository::insert(
            &txn,
            complaint_assignment::Model {
                id: self.id_gen.generate(),
                report_id: report.id.clone(),
                authority_id: authority.id.clone(),
                status: AssignmentStatus::Pending,
                assigned_at: now.into(),
                responded_at: None,
            },
        )
        .await?;

        let complaint_id = match &report.complaint_id {
            Some(existing) => existing.clone(),
            None => {
                let fresh = self.id_gen.generate_complaint_id();
                CrimeReportRepository::assign_complaint_id(&txn, &report.id, &fresh).await?;
                fresh
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            report = %report.id,
            authority = %authority.id,
            complaint = %complaint_id,
            "Assigned complaint"
        );

        Ok(AssignmentOutcome {
            assignment,
            complaint_id,
        })
    }

    /// Accept or reject an assignment as the assigned authority.
    pub async fn respond_to_assignment(
        &self,
        actor: &account::Model,
        assignment_id: &str,
        decision: AssignmentDecision,
    ) -> AppResult<complaint_assignment::Model> {
        let assignment = self.complaint_repo.get_by_id(assignment_id).await?;

        if assignment.authority_id != actor.id {
            return Err(AppError::Forbidden(
                "Assignment belongs to another authority".to_string(),
            ));
        }
        if !assignment.status.is_pending() {
            return Err(AppError::Conflict(format!(
                "Assignment {assignment_id} is already {}",
                assignment.status
            )));
        }

        let now = Utc::now();
        let target = decision.target_status();
        let txn = self.complaint_repo.begin().await?;

        if ComplaintRepository::respond(&txn, assignment_id, target, now).await? == 0 {
            warn!(assignment = %assignment_id, "Lost assignment response race");
            return Err(AppError::Conflict(format!(
                "Assignment {assignment_id} was answered concurrently"
            )));
        }

        if let Some((from, to)) = decision.report_transition() {
            let moved = CrimeReportRepository::transition_status(
                &txn,
                &assignment.report_id,
                from,
                to,
                None,
                now,
            )
            .await?;
            if moved == 0 {
                return Err(AppError::Conflict(format!(
                    "Report {} is no longer {from}",
                    assignment.report_id
                )));
            }

            StatusEventRepository::append(
                &txn,
                self.event(&assignment.report_id, Some(from), to, Some(&actor.id), None, now),
            )
            .await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            assignment = %assignment_id,
            report = %assignment.report_id,
            status = %target,
            "Authority responded to assignment"
        );

        Ok(complaint_assignment::Model {
            status: target,
            responded_at: Some(now.into()),
            ..assignment
        })
    }

    /// Move a report along the status graph.
    ///
    /// The edge is checked before the actor, so an illegal edge is always
    /// `InvalidTransition` whoever asks. Only an admin can move a pending
    /// report, and only while no authority holds an assignment for it.
    pub async fn update_report_status(
        &self,
        actor: &account::Model,
        report_id: &str,
        new_status: ReportStatus,
        feedback: Option<String>,
    ) -> AppResult<crime_report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        check_report_transition(report.status, new_status)?;

        match actor.role {
            AccountRole::Admin => {}
            AccountRole::Authority => {
                let holds = self
                    .complaint_repo
                    .find_active_for_report(report_id)
                    .await?
                    .is_some_and(|a| {
                        a.authority_id == actor.id && a.status == AssignmentStatus::Accepted
                    });
                if !holds {
                    return Err(AppError::Forbidden(
                        "Only the authority handling this complaint may update it".to_string(),
                    ));
                }
            }
            AccountRole::Citizen => {
                return Err(AppError::Forbidden(
                    "Citizens cannot change report status".to_string(),
                ));
            }
        }

        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        if feedback
            .as_ref()
            .is_some_and(|f| f.chars().count() > MAX_FEEDBACK_LEN)
        {
            return Err(AppError::Validation(format!(
                "feedback: at most {MAX_FEEDBACK_LEN} characters"
            )));
        }

        let now = Utc::now();
        let txn = self.report_repo.begin().await?;

        let moved = CrimeReportRepository::transition_status(
            &txn,
            report_id,
            report.status,
            new_status,
            feedback.as_deref(),
            now,
        )
        .await?;
        if moved == 0 {
            return Err(AppError::Conflict(format!(
                "Report {report_id} changed concurrently"
            )));
        }

        // Checked under the report row lock so a concurrent assign cannot slip in.
        if report.status == ReportStatus::Pending {
            let waiting = ComplaintRepository::find_for_report(&txn, report_id)
                .await?
                .into_iter()
                .find(|a| a.status.is_active());
            if let Some(a) = waiting {
                return Err(AppError::Conflict(format!(
                    "Report {report_id} is waiting on authority {}",
                    a.authority_id
                )));
            }
        }

        StatusEventRepository::append(
            &txn,
            self.event(
                report_id,
                Some(report.status),
                new_status,
                Some(&actor.id),
                feedback.clone(),
                now,
            ),
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            report = %report_id,
            from = %report.status,
            to = %new_status,
            actor = %actor.id,
            "Report status updated"
        );

        Ok(crime_report::Model {
            status: new_status,
            feedback: feedback.or(report.feedback),
            updated_at: Some(now.into()),
            ..report
        })
    }

    /// An authority's queue, joined with the reports.
    pub async fn assigned_complaints(
        &self,
        authority_id: &str,
        status: Option<AssignmentStatus>,
    ) -> AppResult<Vec<ComplaintView>> {
        let assignments = self
            .complaint_repo
            .find_for_authority(authority_id, status)
            .await?;
        self.join_reports(assignments).await
    }

    /// All assignments (admin view), joined with the reports.
    pub async fn list_assignments(
        &self,
        status: Option<AssignmentStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<ComplaintView>> {
        let assignments = self.complaint_repo.list(status, limit, offset).await?;
        self.join_reports(assignments).await
    }

    /// The active assignment of a report, if any.
    pub async fn active_assignment(
        &self,
        report_id: &str,
    ) -> AppResult<Option<complaint_assignment::Model>> {
        self.complaint_repo.find_active_for_report(report_id).await
    }

    /// Audit trail of a report in chronological order.
    pub async fn status_history(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<report_status_event::Model>> {
        self.event_repo.find_for_report(report_id).await
    }

    async fn join_reports(
        &self,
        assignments: Vec<complaint_assignment::Model>,
    ) -> AppResult<Vec<ComplaintView>> {
        let report_ids: Vec<String> = assignments.iter().map(|a| a.report_id.clone()).collect();
        let reports: HashMap<String, crime_report::Model> = self
            .report_repo
            .find_by_ids(&report_ids)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        Ok(assignments
            .into_iter()
            .filter_map(|assignment| {
                // Several assignments may share one report.
                let report = reports.get(&assignment.report_id).cloned()?;
                Some(ComplaintView { assignment, report })
            })
            .collect())
    }

    fn event(
        &self,
        report_id: &str,
        from: Option<ReportStatus>,
        to: ReportStatus,
        actor_id: Option<&str>,
        feedback: Option<String>,
        at: chrono::DateTime<Utc>,
    ) -> report_status_event::Model {
        report_status_event::Model {
            id: self.id_gen.generate(),
            report_id: report_id.to_string(),
            from_status: from,
            to_status: to,
            actor_id: actor_id.map(str::to_string),
            feedback,
            created_at: at.into(),
        }
    }
}
