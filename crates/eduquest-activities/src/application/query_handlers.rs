//! Query handlers for the Activities & Grading context.

use chrono::{DateTime, Utc};
use eduquest_core::error::DomainError;
use eduquest_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::aggregates::SubmissionStatus;
use crate::domain::events::ActivityKind;

/// Read-only view of one student's submission.
#[derive(Debug, Serialize)]
pub struct SubmissionView {
    /// The submitting student.
    pub student_id: Uuid,
    /// Latest answer text.
    pub text: String,
    /// Grading status.
    pub status: SubmissionStatus,
    /// When the latest answer was handed in.
    pub submitted_at: DateTime<Utc>,
    /// Awarded score, once reviewed.
    pub score: Option<f64>,
    /// Teacher feedback.
    pub feedback: String,
    /// XP paid out.
    pub xp_awarded: u64,
    /// Gems paid out.
    pub gems_awarded: u64,
    /// When the submission was reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Read-only view of an activity.
#[derive(Debug, Serialize)]
pub struct ActivityView {
    /// The activity identifier.
    pub activity_id: Uuid,
    /// The authoring teacher.
    pub teacher_id: Uuid,
    /// Title shown to students.
    pub title: String,
    /// Instructions.
    pub description: String,
    /// School subject.
    pub subject: String,
    /// Kind of work.
    pub kind: ActivityKind,
    /// Deadline.
    pub due_date: DateTime<Utc>,
    /// Score that earns the full reward.
    pub max_score: f64,
    /// XP for a full score.
    pub xp_reward: u32,
    /// Gems for a full score.
    pub gem_reward: u32,
    /// Whether the activity still accepts submissions.
    pub active: bool,
    /// Submissions ordered by student ID.
    pub submissions: Vec<SubmissionView>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves an activity with its submissions.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the activity was never
/// created or the identifier names another kind of stream, or `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_activity_by_id(
    activity_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ActivityView, DomainError> {
    let stored_events = repo.load_events(activity_id).await?;
    let activity = command_handlers::reconstitute(activity_id, &stored_events)?;
    let Some(details) = activity.details else {
        return Err(DomainError::AggregateNotFound(activity_id));
    };

    let submissions = activity
        .submissions
        .into_iter()
        .map(|(student_id, s)| SubmissionView {
            student_id,
            text: s.text,
            status: s.status,
            submitted_at: s.submitted_at,
            score: s.score,
            feedback: s.feedback,
            xp_awarded: s.xp_awarded,
            gems_awarded: s.gems_awarded,
            reviewed_at: s.reviewed_at,
        })
        .collect();

    Ok(ActivityView {
        activity_id,
        teacher_id: details.teacher_id,
        title: details.title,
        description: details.description,
        subject: details.subject,
        kind: details.kind,
        due_date: details.due_date,
        max_score: details.max_score,
        xp_reward: details.reward.xp,
        gem_reward: details.reward.gems,
        active: details.active,
        submissions,
        version: activity.version,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eduquest_core::aggregate::AggregateRoot;
    use eduquest_core::error::DomainError;
    use eduquest_progression::domain::aggregates::StudentProgress;
    use eduquest_progression::domain::engine::BaseReward;
    use uuid::Uuid;

    use crate::application::query_handlers::get_activity_by_id;
    use crate::domain::aggregates::{Activity, SubmissionStatus};
    use crate::domain::events::{ActivityKind, ReviewOutcome};
    use eduquest_test_support::{EmptyEventRepository, FixedClock, RecordingEventRepository};

    #[tokio::test]
    async fn test_get_activity_by_id_returns_view_with_submissions() {
        // Arrange
        let activity_id = Uuid::new_v4();
        let first = Uuid::from_u128(1);
        let second = Uuid::from_u128(2);
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 5, 3, 8, 0, 0).unwrap());
        let mut activity = Activity::new(activity_id);
        activity
            .create(
                Uuid::new_v4(),
                "Volcano model".to_owned(),
                "Build and explain".to_owned(),
                "Geography".to_owned(),
                ActivityKind::Project,
                Utc.with_ymd_and_hms(2026, 5, 20, 0, 0, 0).unwrap(),
                20.0,
                BaseReward { xp: 60, gems: 12 },
                Uuid::new_v4(),
                &clock,
            )
            .unwrap();
        activity
            .submit(second, "Baking soda".to_owned(), Uuid::new_v4(), &clock)
            .unwrap();
        activity
            .submit(first, "Clay and vinegar".to_owned(), Uuid::new_v4(), &clock)
            .unwrap();
        activity
            .review(
                first,
                15.0,
                "Nice".to_owned(),
                ReviewOutcome::Verified,
                Uuid::new_v4(),
                &clock,
            )
            .unwrap();
        let repo = RecordingEventRepository::new(Ok(activity.pending_stored_events()));

        // Act
        let view = get_activity_by_id(activity_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.title, "Volcano model");
        assert_eq!(view.kind, ActivityKind::Project);
        assert_eq!(view.version, 4);
        assert!(view.active);
        assert_eq!(view.submissions.len(), 2);
        assert_eq!(view.submissions[0].student_id, first);
        assert_eq!(view.submissions[0].status, SubmissionStatus::Verified);
        assert_eq!(view.submissions[0].score, Some(15.0));
        assert_eq!(view.submissions[0].xp_awarded, 45);
        assert_eq!(view.submissions[0].gems_awarded, 9);
        assert_eq!(view.submissions[1].student_id, second);
        assert_eq!(view.submissions[1].status, SubmissionStatus::Submitted);
        assert!(view.submissions[1].reviewed_at.is_none());
    }

    #[tokio::test]
    async fn test_get_activity_by_id_returns_not_found_when_no_events() {
        // Arrange
        let activity_id = Uuid::new_v4();

        // Act
        let result = get_activity_by_id(activity_id, &EmptyEventRepository).await;

        // Assert
        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, activity_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_activity_by_id_reports_deactivation() {
        // Arrange
        let activity_id = Uuid::new_v4();
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 5, 3, 8, 0, 0).unwrap());
        let mut activity = Activity::new(activity_id);
        activity
            .create(
                Uuid::new_v4(),
                "Fractions quiz".to_owned(),
                String::new(),
                "Math".to_owned(),
                ActivityKind::Quiz,
                Utc.with_ymd_and_hms(2026, 5, 20, 0, 0, 0).unwrap(),
                10.0,
                BaseReward { xp: 30, gems: 5 },
                Uuid::new_v4(),
                &clock,
            )
            .unwrap();
        activity
            .deactivate("Replaced".to_owned(), Uuid::new_v4(), &clock)
            .unwrap();
        let repo = RecordingEventRepository::new(Ok(activity.pending_stored_events()));

        // Act
        let view = get_activity_by_id(activity_id, &repo).await.unwrap();

        // Assert
        assert!(!view.active);
        assert_eq!(view.version, 2);
    }

    #[tokio::test]
    async fn test_get_activity_by_id_ignores_a_student_stream() {
        // Arrange
        let student_id = Uuid::new_v4();
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 5, 3, 8, 0, 0).unwrap());
        let mut student = StudentProgress::new(student_id);
        student
            .enroll("Mina".to_owned(), Uuid::new_v4(), &clock)
            .unwrap();
        let repo = RecordingEventRepository::new(Ok(student.pending_stored_events()));

        // Act
        let result = get_activity_by_id(student_id, &repo).await;

        // Assert
        assert_eq!(result.unwrap_err(), DomainError::AggregateNotFound(student_id));
    }
}
