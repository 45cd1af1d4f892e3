//! Aggregate roots for the Activities & Grading context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use eduquest_core::aggregate::AggregateRoot;
use eduquest_core::clock::Clock;
use eduquest_core::error::DomainError;
use eduquest_core::event::EventMetadata;
use eduquest_progression::domain::engine::{self, BaseReward};
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    ActivityCreated, ActivityDeactivated, ActivityEvent, ActivityEventKind, ActivityKind,
    ActivityUpdated, ReviewOutcome, SubmissionReviewed, SubmissionTiming, WorkSubmitted,
};

/// Where a submission is in the grading flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting review, handed in on time.
    Submitted,
    /// Awaiting review, handed in after the due date.
    Late,
    /// Accepted and rewarded.
    Verified,
    /// Not accepted; the student may resubmit.
    Rejected,
}

/// Published activity details.
#[derive(Debug, Clone)]
pub(crate) struct ActivityDetails {
    pub teacher_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub kind: ActivityKind,
    pub due_date: DateTime<Utc>,
    pub max_score: f64,
    pub reward: BaseReward,
    pub active: bool,
}

/// Edits to an activity; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ActivityChanges {
    /// New title.
    pub title: Option<String>,
    /// New instructions.
    pub description: Option<String>,
    /// New subject.
    pub subject: Option<String>,
    /// New kind of work.
    pub kind: Option<ActivityKind>,
    /// New deadline; applies to later submissions only.
    pub due_date: Option<DateTime<Utc>>,
    /// New maximum score; applies to later reviews only.
    pub max_score: Option<f64>,
    /// New full-score XP.
    pub xp_reward: Option<u32>,
    /// New full-score gems.
    pub gem_reward: Option<u32>,
}

impl ActivityChanges {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.subject.is_none()
            && self.kind.is_none()
            && self.due_date.is_none()
            && self.max_score.is_none()
            && self.xp_reward.is_none()
            && self.gem_reward.is_none()
    }
}

/// One student's latest submission.
#[derive(Debug, Clone)]
pub(crate) struct Submission {
    pub text: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<f64>,
    pub feedback: String,
    pub xp_awarded: u64,
    pub gems_awarded: u64,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Reward terms of a verified submission, ready to be granted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradedReward {
    /// Awarded score.
    pub score: f64,
    /// The activity's maximum score.
    pub max_score: f64,
    /// The activity's full-score reward.
    pub base: BaseReward,
    /// XP the score earns.
    pub xp_awarded: u64,
    /// Gems the score earns.
    pub gems_awarded: u64,
}

/// The aggregate root for an activity and its submissions.
#[derive(Debug)]
pub struct Activity {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Set once the activity is created.
    pub(crate) details: Option<ActivityDetails>,
    /// Latest submission per student.
    pub(crate) submissions: BTreeMap<Uuid, Submission>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ActivityEvent>,
}

impl Activity {
    /// Creates an empty activity stream.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            details: None,
            submissions: BTreeMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn mutate(&mut self, kind: &ActivityEventKind, occurred_at: DateTime<Utc>) {
        match kind {
            ActivityEventKind::ActivityCreated(payload) => {
                self.details = Some(ActivityDetails {
                    teacher_id: payload.teacher_id,
                    title: payload.title.clone(),
                    description: payload.description.clone(),
                    subject: payload.subject.clone(),
                    kind: payload.kind,
                    due_date: payload.due_date,
                    max_score: payload.max_score,
                    reward: BaseReward {
                        xp: payload.xp_reward,
                        gems: payload.gem_reward,
                    },
                    active: true,
                });
            }
            ActivityEventKind::ActivityUpdated(payload) => {
                if let Some(details) = self.details.as_mut() {
                    details.title.clone_from(&payload.title);
                    details.description.clone_from(&payload.description);
                    details.subject.clone_from(&payload.subject);
                    details.kind = payload.kind;
                    details.due_date = payload.due_date;
                    details.max_score = payload.max_score;
                    details.reward = BaseReward {
                        xp: payload.xp_reward,
                        gems: payload.gem_reward,
                    };
                }
            }
            ActivityEventKind::ActivityDeactivated(_) => {
                if let Some(details) = self.details.as_mut() {
                    details.active = false;
                }
            }
            ActivityEventKind::WorkSubmitted(payload) => {
                let status = match payload.timing {
                    SubmissionTiming::OnTime => SubmissionStatus::Submitted,
                    SubmissionTiming::Late => SubmissionStatus::Late,
                };
                self.submissions.insert(
                    payload.student_id,
                    Submission {
                        text: payload.text.clone(),
                        status,
                        submitted_at: occurred_at,
                        score: None,
                        feedback: String::new(),
                        xp_awarded: 0,
                        gems_awarded: 0,
                        reviewed_at: None,
                    },
                );
            }
            ActivityEventKind::SubmissionReviewed(payload) => {
                if let Some(submission) = self.submissions.get_mut(&payload.student_id) {
                    submission.status = match payload.outcome {
                        ReviewOutcome::Verified => SubmissionStatus::Verified,
                        ReviewOutcome::Rejected => SubmissionStatus::Rejected,
                    };
                    submission.score = Some(payload.score);
                    submission.feedback.clone_from(&payload.feedback);
                    submission.xp_awarded = payload.xp_awarded;
                    submission.gems_awarded = payload.gems_awarded;
                    submission.reviewed_at = Some(occurred_at);
                }
            }
        }
    }

    fn record(&mut self, kind: ActivityEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let metadata = EventMetadata::new(
            kind.event_type(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock.now(),
        );
        self.mutate(&kind, metadata.occurred_at);
        self.uncommitted_events.push(ActivityEvent { metadata, kind });
    }

    fn details(&self) -> Result<&ActivityDetails, DomainError> {
        self.details
            .as_ref()
            .ok_or(DomainError::AggregateNotFound(self.id))
    }

    fn active_details(&self) -> Result<&ActivityDetails, DomainError> {
        let details = self.details()?;
        if details.active {
            Ok(details)
        } else {
            Err(DomainError::Validation(format!(
                "activity {} is no longer active",
                self.id
            )))
        }
    }

    /// Whether the activity exists and still accepts work.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.details.as_ref().is_some_and(|d| d.active)
    }

    /// Publishes the activity, producing an `ActivityCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the activity already exists or
    /// `max_score` is not a finite number.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        teacher_id: Uuid,
        title: String,
        description: String,
        subject: String,
        kind: ActivityKind,
        due_date: DateTime<Utc>,
        max_score: f64,
        reward: BaseReward,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.details.is_some() {
            return Err(DomainError::Validation(format!(
                "activity {} already exists",
                self.id
            )));
        }
        if !max_score.is_finite() {
            return Err(DomainError::Validation(
                "max score must be a finite number".into(),
            ));
        }

        let event = ActivityEventKind::ActivityCreated(ActivityCreated {
            activity_id: self.id,
            teacher_id,
            title,
            description,
            subject,
            kind,
            due_date,
            max_score,
            xp_reward: reward.xp,
            gem_reward: reward.gems,
        });
        self.record(event, correlation_id, clock);
        Ok(())
    }

    /// Edits an active activity, producing an `ActivityUpdated` event.
    /// Reviews already recorded keep the reward they were graded with.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the activity does not
    /// exist, or `DomainError::Validation` if it is no longer active, nothing
    /// changes, the new title is blank or the new max score is not finite.
    pub fn update(
        &mut self,
        changes: ActivityChanges,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let details = self.active_details()?;
        if changes.is_empty() {
            return Err(DomainError::Validation(
                "activity update must change at least one field".into(),
            ));
        }
        if changes.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DomainError::Validation(
                "activity title must not be empty".into(),
            ));
        }
        if changes.max_score.is_some_and(|m| !m.is_finite()) {
            return Err(DomainError::Validation(
                "max score must be a finite number".into(),
            ));
        }

        let event = ActivityEventKind::ActivityUpdated(ActivityUpdated {
            activity_id: self.id,
            title: changes
                .title
                .map_or_else(|| details.title.clone(), |t| t.trim().to_owned()),
            description: changes
                .description
                .unwrap_or_else(|| details.description.clone()),
            subject: changes.subject.unwrap_or_else(|| details.subject.clone()),
            kind: changes.kind.unwrap_or(details.kind),
            due_date: changes.due_date.unwrap_or(details.due_date),
            max_score: changes.max_score.unwrap_or(details.max_score),
            xp_reward: changes.xp_reward.unwrap_or(details.reward.xp),
            gem_reward: changes.gem_reward.unwrap_or(details.reward.gems),
        });
        self.record(event, correlation_id, clock);
        Ok(())
    }

    /// Withdraws the activity, producing an `ActivityDeactivated` event.
    /// Pending submissions can still be reviewed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the activity does not
    /// exist, or `DomainError::Validation` if it is already inactive.
    pub fn deactivate(
        &mut self,
        reason: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.active_details()?;
        let event = ActivityEventKind::ActivityDeactivated(ActivityDeactivated {
            activity_id: self.id,
            reason,
        });
        self.record(event, correlation_id, clock);
        Ok(())
    }

    /// Records a student's work, producing a `WorkSubmitted` event. Work
    /// handed in after the due date is marked late. A resubmission replaces
    /// the earlier one unless it was already verified.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the activity does not
    /// exist, or `DomainError::Validation` if it is no longer active or the
    /// student's work was already verified.
    pub fn submit(
        &mut self,
        student_id: Uuid,
        text: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<SubmissionStatus, DomainError> {
        let due_date = self.active_details()?.due_date;
        if self
            .submissions
            .get(&student_id)
            .is_some_and(|s| s.status == SubmissionStatus::Verified)
        {
            return Err(DomainError::Validation(format!(
                "submission by student {student_id} is already verified"
            )));
        }

        let timing = if clock.now() > due_date {
            SubmissionTiming::Late
        } else {
            SubmissionTiming::OnTime
        };
        let event = ActivityEventKind::WorkSubmitted(WorkSubmitted {
            activity_id: self.id,
            student_id,
            text,
            timing,
        });
        self.record(event, correlation_id, clock);

        Ok(match timing {
            SubmissionTiming::OnTime => SubmissionStatus::Submitted,
            SubmissionTiming::Late => SubmissionStatus::Late,
        })
    }

    /// Reward terms recorded for a student's verified submission, or `None`
    /// if the work is not verified.
    #[must_use]
    pub fn verified_reward(&self, student_id: Uuid) -> Option<GradedReward> {
        let details = self.details.as_ref()?;
        let submission = self.submissions.get(&student_id)?;
        if submission.status != SubmissionStatus::Verified {
            return None;
        }
        Some(GradedReward {
            score: submission.score?,
            max_score: details.max_score,
            base: details.reward,
            xp_awarded: submission.xp_awarded,
            gems_awarded: submission.gems_awarded,
        })
    }

    /// Verifies or rejects a student's submission, producing a
    /// `SubmissionReviewed` event. A verified submission earns the activity's
    /// reward scaled by `score / max_score`.
    ///
    /// Returns the reward terms when the outcome is `Verified`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the activity does not
    /// exist, or `DomainError::Validation` if the student has no pending
    /// submission or the score is negative or not finite.
    pub fn review(
        &mut self,
        student_id: Uuid,
        score: f64,
        feedback: String,
        outcome: ReviewOutcome,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Option<GradedReward>, DomainError> {
        let details = self.details()?;
        let (max_score, base) = (details.max_score, details.reward);

        match self.submissions.get(&student_id).map(|s| s.status) {
            None => {
                return Err(DomainError::Validation(format!(
                    "no submission from student {student_id}"
                )));
            }
            Some(SubmissionStatus::Verified | SubmissionStatus::Rejected) => {
                return Err(DomainError::Validation(format!(
                    "submission by student {student_id} has already been reviewed"
                )));
            }
            Some(SubmissionStatus::Submitted | SubmissionStatus::Late) => {}
        }
        if !score.is_finite() || score < 0.0 {
            return Err(DomainError::Validation(
                "score must be a non-negative number".into(),
            ));
        }

        let graded = match outcome {
            ReviewOutcome::Verified => {
                let ratio = engine::reward_ratio(score, max_score);
                Some(GradedReward {
                    score,
                    max_score,
                    base,
                    xp_awarded: engine::scale_reward(base.xp, ratio),
                    gems_awarded: engine::scale_reward(base.gems, ratio),
                })
            }
            ReviewOutcome::Rejected => None,
        };

        let event = ActivityEventKind::SubmissionReviewed(SubmissionReviewed {
            activity_id: self.id,
            student_id,
            score,
            feedback,
            outcome,
            xp_awarded: graded.map_or(0, |g| g.xp_awarded),
            gems_awarded: graded.map_or(0, |g| g.gems_awarded),
        });
        self.record(event, correlation_id, clock);
        Ok(graded)
    }
}

impl AggregateRoot for Activity {
    type Event = ActivityEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.mutate(&event.kind, event.metadata.occurred_at);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use eduquest_core::aggregate::replay;
    use eduquest_core::event::DomainEvent;

    use crate::domain::events::{
        ACTIVITY_CREATED_EVENT_TYPE, ACTIVITY_DEACTIVATED_EVENT_TYPE, ACTIVITY_UPDATED_EVENT_TYPE,
        SUBMISSION_REVIEWED_EVENT_TYPE, WORK_SUBMITTED_EVENT_TYPE,
    };

    #[derive(Debug)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn at(day: u32) -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 4, day, 9, 0, 0).unwrap())
    }

    /// Activity due on April 10th, max score 100, reward 80 XP / 15 gems.
    fn published(activity_id: Uuid) -> Activity {
        let mut activity = Activity::new(activity_id);
        activity
            .create(
                Uuid::new_v4(),
                "Fractions worksheet".to_owned(),
                "Solve all ten problems".to_owned(),
                "Mathematics".to_owned(),
                ActivityKind::Quiz,
                Utc.with_ymd_and_hms(2026, 4, 10, 23, 59, 0).unwrap(),
                100.0,
                BaseReward { xp: 80, gems: 15 },
                Uuid::new_v4(),
                &at(1),
            )
            .unwrap();
        activity
    }

    #[test]
    fn test_create_produces_activity_created_event() {
        // Arrange
        let activity_id = Uuid::new_v4();

        // Act
        let activity = published(activity_id);

        // Assert
        let events = activity.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), ACTIVITY_CREATED_EVENT_TYPE);
        assert_eq!(events[0].metadata().aggregate_id, activity_id);
        assert_eq!(events[0].metadata().sequence_number, 1);
    }

    #[test]
    fn test_create_twice_is_rejected() {
        let mut activity = published(Uuid::new_v4());

        let result = activity.create(
            Uuid::new_v4(),
            "Again".to_owned(),
            String::new(),
            "Science".to_owned(),
            ActivityKind::Assignment,
            Utc.with_ymd_and_hms(2026, 4, 10, 0, 0, 0).unwrap(),
            100.0,
            BaseReward { xp: 50, gems: 10 },
            Uuid::new_v4(),
            &at(1),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_update_extends_deadline_for_later_submissions() {
        // Arrange
        let mut activity = published(Uuid::new_v4());

        // Act
        activity
            .update(
                ActivityChanges {
                    due_date: Some(Utc.with_ymd_and_hms(2026, 4, 20, 23, 59, 0).unwrap()),
                    xp_reward: Some(120),
                    ..ActivityChanges::default()
                },
                Uuid::new_v4(),
                &at(2),
            )
            .unwrap();
        let status = activity
            .submit(Uuid::new_v4(), "3/4".to_owned(), Uuid::new_v4(), &at(12))
            .unwrap();

        // Assert
        assert_eq!(
            activity.uncommitted_events()[1].event_type(),
            ACTIVITY_UPDATED_EVENT_TYPE
        );
        let details = activity.details.as_ref().unwrap();
        assert_eq!(details.title, "Fractions worksheet");
        assert_eq!(details.reward, BaseReward { xp: 120, gems: 15 });
        assert_eq!(status, SubmissionStatus::Submitted);
    }

    #[test]
    fn test_update_without_changes_is_rejected() {
        let mut activity = published(Uuid::new_v4());

        let result = activity.update(ActivityChanges::default(), Uuid::new_v4(), &at(2));

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(activity.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let mut activity = published(Uuid::new_v4());

        let result = activity.update(
            ActivityChanges {
                title: Some("   ".to_owned()),
                ..ActivityChanges::default()
            },
            Uuid::new_v4(),
            &at(2),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_deactivated_activity_rejects_work_and_edits() {
        // Arrange
        let mut activity = published(Uuid::new_v4());
        activity
            .deactivate("Replaced by unit test".to_owned(), Uuid::new_v4(), &at(3))
            .unwrap();

        // Act
        let submission = activity.submit(Uuid::new_v4(), "x".to_owned(), Uuid::new_v4(), &at(4));
        let edit = activity.update(
            ActivityChanges {
                subject: Some("Physics".to_owned()),
                ..ActivityChanges::default()
            },
            Uuid::new_v4(),
            &at(4),
        );
        let again = activity.deactivate(String::new(), Uuid::new_v4(), &at(4));

        // Assert
        assert!(!activity.is_active());
        assert_eq!(
            activity.uncommitted_events()[1].event_type(),
            ACTIVITY_DEACTIVATED_EVENT_TYPE
        );
        for result in [submission.map(|_| ()), edit, again] {
            match result.unwrap_err() {
                DomainError::Validation(msg) => assert!(msg.ends_with("is no longer active")),
                other => panic!("expected Validation, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_pending_work_can_be_reviewed_after_deactivation() {
        let mut activity = published(Uuid::new_v4());
        let student_id = Uuid::new_v4();
        activity
            .submit(student_id, "work".to_owned(), Uuid::new_v4(), &at(5))
            .unwrap();
        activity
            .deactivate(String::new(), Uuid::new_v4(), &at(6))
            .unwrap();

        let graded = activity
            .review(
                student_id,
                100.0,
                String::new(),
                ReviewOutcome::Verified,
                Uuid::new_v4(),
                &at(7),
            )
            .unwrap();

        assert_eq!(graded.unwrap().xp_awarded, 80);
        assert_eq!(activity.verified_reward(student_id), graded);
    }

    #[test]
    fn test_submit_before_due_date_is_on_time() {
        // Arrange
        let mut activity = published(Uuid::new_v4());
        let student_id = Uuid::new_v4();

        // Act
        let status = activity
            .submit(student_id, "3/4".to_owned(), Uuid::new_v4(), &at(5))
            .unwrap();

        // Assert
        assert_eq!(status, SubmissionStatus::Submitted);
        let event = &activity.uncommitted_events()[1];
        assert_eq!(event.event_type(), WORK_SUBMITTED_EVENT_TYPE);
        match &event.kind {
            ActivityEventKind::WorkSubmitted(payload) => {
                assert_eq!(payload.student_id, student_id);
                assert_eq!(payload.timing, SubmissionTiming::OnTime);
            }
            other => panic!("expected WorkSubmitted, got {other:?}"),
        }
    }

    #[test]
    fn test_submit_after_due_date_is_late() {
        let mut activity = published(Uuid::new_v4());

        let status = activity
            .submit(Uuid::new_v4(), "3/4".to_owned(), Uuid::new_v4(), &at(12))
            .unwrap();

        assert_eq!(status, SubmissionStatus::Late);
    }

    #[test]
    fn test_submit_to_unknown_activity_is_not_found() {
        let activity_id = Uuid::new_v4();
        let mut activity = Activity::new(activity_id);

        let result = activity.submit(Uuid::new_v4(), "x".to_owned(), Uuid::new_v4(), &at(2));

        assert_eq!(result.unwrap_err(), DomainError::AggregateNotFound(activity_id));
    }

    #[test]
    fn test_review_verified_scales_reward() {
        // Arrange
        let mut activity = published(Uuid::new_v4());
        let student_id = Uuid::new_v4();
        activity
            .submit(student_id, "work".to_owned(), Uuid::new_v4(), &at(5))
            .unwrap();

        // Act
        let graded = activity
            .review(
                student_id,
                50.0,
                "Half right".to_owned(),
                ReviewOutcome::Verified,
                Uuid::new_v4(),
                &at(6),
            )
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(graded.xp_awarded, 40);
        assert_eq!(graded.gems_awarded, 8);
        assert_eq!(graded.base, BaseReward { xp: 80, gems: 15 });

        let event = activity.uncommitted_events().last().unwrap();
        assert_eq!(event.event_type(), SUBMISSION_REVIEWED_EVENT_TYPE);
        let submission = &activity.submissions[&student_id];
        assert_eq!(submission.status, SubmissionStatus::Verified);
        assert_eq!(submission.xp_awarded, 40);
        assert_eq!(submission.feedback, "Half right");
    }

    #[test]
    fn test_review_rejected_awards_nothing() {
        let mut activity = published(Uuid::new_v4());
        let student_id = Uuid::new_v4();
        activity
            .submit(student_id, "work".to_owned(), Uuid::new_v4(), &at(5))
            .unwrap();

        let graded = activity
            .review(
                student_id,
                90.0,
                "Copied".to_owned(),
                ReviewOutcome::Rejected,
                Uuid::new_v4(),
                &at(6),
            )
            .unwrap();

        assert!(graded.is_none());
        assert_eq!(activity.submissions[&student_id].xp_awarded, 0);
        assert_eq!(
            activity.submissions[&student_id].status,
            SubmissionStatus::Rejected
        );
    }

    #[test]
    fn test_review_without_submission_is_rejected() {
        let mut activity = published(Uuid::new_v4());

        let result = activity.review(
            Uuid::new_v4(),
            10.0,
            String::new(),
            ReviewOutcome::Verified,
            Uuid::new_v4(),
            &at(6),
        );

        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.starts_with("no submission")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_verified_submission_cannot_be_reviewed_or_resubmitted() {
        // Arrange
        let mut activity = published(Uuid::new_v4());
        let student_id = Uuid::new_v4();
        activity
            .submit(student_id, "work".to_owned(), Uuid::new_v4(), &at(5))
            .unwrap();
        activity
            .review(
                student_id,
                100.0,
                String::new(),
                ReviewOutcome::Verified,
                Uuid::new_v4(),
                &at(6),
            )
            .unwrap();

        // Act
        let second_review = activity.review(
            student_id,
            100.0,
            String::new(),
            ReviewOutcome::Verified,
            Uuid::new_v4(),
            &at(7),
        );
        let resubmission = activity.submit(student_id, "again".to_owned(), Uuid::new_v4(), &at(7));

        // Assert
        assert!(matches!(second_review, Err(DomainError::Validation(_))));
        assert!(matches!(resubmission, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_rejected_submission_can_be_resubmitted() {
        let mut activity = published(Uuid::new_v4());
        let student_id = Uuid::new_v4();
        activity
            .submit(student_id, "draft".to_owned(), Uuid::new_v4(), &at(5))
            .unwrap();
        activity
            .review(
                student_id,
                0.0,
                "Incomplete".to_owned(),
                ReviewOutcome::Rejected,
                Uuid::new_v4(),
                &at(6),
            )
            .unwrap();

        let status = activity
            .submit(student_id, "final".to_owned(), Uuid::new_v4(), &at(7))
            .unwrap();

        assert_eq!(status, SubmissionStatus::Submitted);
        assert_eq!(activity.submissions[&student_id].text, "final");
        assert!(activity.submissions[&student_id].score.is_none());
    }

    #[test]
    fn test_replay_restores_submissions() {
        // Arrange
        let activity_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let mut activity = published(activity_id);
        activity
            .submit(student_id, "work".to_owned(), Uuid::new_v4(), &at(11))
            .unwrap();
        let stored = activity.pending_stored_events();

        // Act
        let rebuilt = replay(Activity::new(activity_id), &stored).unwrap();

        // Assert
        assert_eq!(rebuilt.version(), 2);
        let submission = &rebuilt.submissions[&student_id];
        assert_eq!(submission.status, SubmissionStatus::Late);
        assert_eq!(submission.submitted_at, at(11).0);
    }
}
