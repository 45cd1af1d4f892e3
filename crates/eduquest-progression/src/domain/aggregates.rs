//! Aggregate roots for the Student Progression context.

use std::collections::HashMap;

use eduquest_core::aggregate::AggregateRoot;
use eduquest_core::clock::Clock;
use eduquest_core::error::DomainError;
use eduquest_core::event::EventMetadata;
use uuid::Uuid;

use super::engine::{self, BaseReward, ProgressionState, RewardOutcome, StreakTransition};
use super::events::{
    ExperienceCorrected, ProgressEvent, ProgressEventKind, RewardGranted, RewardSource,
    StreakUpdated, StudentEnrolled,
};

/// The aggregate root for one student's progression.
#[derive(Debug)]
pub struct StudentProgress {
    /// Aggregate identifier (the student identifier).
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Display name, set on enrollment.
    pub(crate) name: Option<String>,
    /// Current progression values.
    pub(crate) state: ProgressionState,
    /// XP and gems already paid, per reward source.
    pub(crate) paid_rewards: HashMap<RewardSource, (u64, u64)>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ProgressEvent>,
}

impl StudentProgress {
    /// Creates an empty, not yet enrolled progression.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            name: None,
            state: ProgressionState::new(),
            paid_rewards: HashMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Current progression values, including uncommitted changes.
    #[must_use]
    pub fn state(&self) -> ProgressionState {
        self.state
    }

    /// Whether the student has been enrolled.
    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.name.is_some()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    /// Folds a payload into the in-memory state.
    fn mutate(&mut self, kind: &ProgressEventKind) {
        match kind {
            ProgressEventKind::StudentEnrolled(payload) => {
                self.name = Some(payload.name.clone());
                self.state = ProgressionState::new();
            }
            ProgressEventKind::RewardGranted(payload) => {
                self.paid_rewards
                    .insert(payload.source, (payload.xp_awarded, payload.gems_awarded));
                let xp = self.state.xp.saturating_add(payload.xp_awarded);
                self.state = ProgressionState {
                    xp,
                    level: engine::compute_level(xp),
                    gems: self.state.gems.saturating_add(payload.gems_awarded),
                    ..self.state
                };
            }
            ProgressEventKind::StreakUpdated(payload) => {
                self.state.streak = payload.streak;
                self.state.last_active_date = Some(payload.last_active_date);
            }
            ProgressEventKind::ExperienceCorrected(payload) => {
                self.state = engine::correct_experience(&self.state, payload.xp);
            }
        }
    }

    /// Records a new event: updates state and queues it for persistence.
    fn record(&mut self, kind: ProgressEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        // TODO: event_id uses Uuid::new_v4() which breaks replay determinism.
        let metadata = EventMetadata::new(
            kind.event_type(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock.now(),
        );
        self.mutate(&kind);
        self.uncommitted_events.push(ProgressEvent { metadata, kind });
    }

    fn ensure_enrolled(&self) -> Result<(), DomainError> {
        if self.is_enrolled() {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    /// Enrolls the student with zeroed progression, producing a
    /// `StudentEnrolled` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the student is already enrolled.
    pub fn enroll(
        &mut self,
        name: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.is_enrolled() {
            return Err(DomainError::Validation(format!(
                "student {} is already enrolled",
                self.id
            )));
        }
        let kind = ProgressEventKind::StudentEnrolled(StudentEnrolled {
            student_id: self.id,
            name,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Scales `base` by `raw_score / max_score` and adds it, producing a
    /// `RewardGranted` event.
    ///
    /// A source that was already paid produces no event; the earlier award
    /// is returned with the current state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the student is not
    /// enrolled, and `DomainError::Validation` if a score is not a finite
    /// number or `raw_score` is negative.
    pub fn grant_reward(
        &mut self,
        source: RewardSource,
        raw_score: f64,
        max_score: f64,
        base: BaseReward,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<RewardOutcome, DomainError> {
        self.ensure_enrolled()?;
        if let Some(&(xp_awarded, gems_awarded)) = self.paid_rewards.get(&source) {
            return Ok(RewardOutcome {
                state: self.state,
                xp_awarded,
                gems_awarded,
            });
        }
        if !raw_score.is_finite() || raw_score < 0.0 {
            return Err(DomainError::Validation(
                "score must be a non-negative number".into(),
            ));
        }
        if !max_score.is_finite() {
            return Err(DomainError::Validation(
                "max score must be a finite number".into(),
            ));
        }

        let outcome = engine::apply_reward(&self.state, raw_score, max_score, base);
        let kind = ProgressEventKind::RewardGranted(RewardGranted {
            student_id: self.id,
            source,
            raw_score,
            max_score,
            xp_awarded: outcome.xp_awarded,
            gems_awarded: outcome.gems_awarded,
            level_after: outcome.state.level,
        });
        self.record(kind, correlation_id, clock);
        Ok(outcome)
    }

    /// Updates the streak for the clock's current day. Produces a
    /// `StreakUpdated` event only when the streak or last active date
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the student is not
    /// enrolled.
    pub fn record_login(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<ProgressionState, DomainError> {
        self.ensure_enrolled()?;

        let today = clock.today();
        let transition = StreakTransition::classify(self.state.last_active_date, today);
        let next = engine::update_streak(&self.state, today);
        if next == self.state {
            return Ok(next);
        }

        let kind = ProgressEventKind::StreakUpdated(StreakUpdated {
            student_id: self.id,
            transition,
            streak: next.streak,
            last_active_date: next.last_active_date.unwrap_or(today),
        });
        self.record(kind, correlation_id, clock);
        Ok(self.state)
    }

    /// Overwrites the XP total, producing an `ExperienceCorrected` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the student is not
    /// enrolled, and `DomainError::Validation` if `reason` is blank.
    pub fn correct_experience(
        &mut self,
        xp: u64,
        reason: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<ProgressionState, DomainError> {
        self.ensure_enrolled()?;
        if reason.trim().is_empty() {
            return Err(DomainError::Validation(
                "correction reason must not be empty".into(),
            ));
        }

        let kind = ProgressEventKind::ExperienceCorrected(ExperienceCorrected {
            student_id: self.id,
            xp,
            reason,
        });
        self.record(kind, correlation_id, clock);
        Ok(self.state)
    }
}

impl AggregateRoot for StudentProgress {
    type Event = ProgressEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.mutate(&event.kind);
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
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use eduquest_core::aggregate::replay;
    use eduquest_core::event::DomainEvent;

    use crate::domain::events::{
        EXPERIENCE_CORRECTED_EVENT_TYPE, REWARD_GRANTED_EVENT_TYPE, STREAK_UPDATED_EVENT_TYPE,
        STUDENT_ENROLLED_EVENT_TYPE,
    };

    #[derive(Debug)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn clock_on(day: u32) -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 3, day, 8, 30, 0).unwrap())
    }

    /// Builds an enrolled student whose events are already committed.
    fn enrolled(student_id: Uuid) -> StudentProgress {
        let mut progress = StudentProgress::new(student_id);
        progress
            .enroll("Asha".to_owned(), Uuid::new_v4(), &clock_on(1))
            .unwrap();
        commit(&mut progress);
        progress
    }

    /// Mirrors what a command handler leaves behind after a successful append.
    #[allow(clippy::cast_possible_wrap)]
    fn commit(progress: &mut StudentProgress) {
        progress.version += progress.uncommitted_events().len() as i64;
        progress.clear_uncommitted_events();
    }

    #[test]
    fn test_enroll_produces_student_enrolled_event() {
        // Arrange
        let student_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let clock = clock_on(1);
        let mut progress = StudentProgress::new(student_id);

        // Act
        progress
            .enroll("Asha".to_owned(), correlation_id, &clock)
            .unwrap();

        // Assert
        let events = progress.uncommitted_events();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.event_type(), STUDENT_ENROLLED_EVENT_TYPE);

        let meta = event.metadata();
        assert_eq!(meta.aggregate_id, student_id);
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        assert_eq!(meta.causation_id, correlation_id);
        assert_eq!(meta.occurred_at, clock.0);

        assert_eq!(progress.state(), ProgressionState::new());
    }

    #[test]
    fn test_enroll_twice_is_rejected() {
        // Arrange
        let mut progress = enrolled(Uuid::new_v4());

        // Act
        let result = progress.enroll("Asha".to_owned(), Uuid::new_v4(), &clock_on(2));

        // Assert
        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("already enrolled")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(progress.uncommitted_events().is_empty());
    }

    #[test]
    fn test_grant_reward_produces_reward_granted_event() {
        // Arrange
        let student_id = Uuid::new_v4();
        let activity_id = Uuid::new_v4();
        let mut progress = enrolled(student_id);

        // Act
        let outcome = progress
            .grant_reward(
                RewardSource::Activity { activity_id },
                100.0,
                100.0,
                BaseReward { xp: 80, gems: 15 },
                Uuid::new_v4(),
                &clock_on(2),
            )
            .unwrap();

        // Assert
        assert_eq!(outcome.xp_awarded, 80);
        assert_eq!(outcome.gems_awarded, 15);
        assert_eq!(progress.state().xp, 80);

        let events = progress.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), REWARD_GRANTED_EVENT_TYPE);
        assert_eq!(events[0].metadata().sequence_number, 2);

        match &events[0].kind {
            ProgressEventKind::RewardGranted(payload) => {
                assert_eq!(payload.student_id, student_id);
                assert_eq!(payload.source, RewardSource::Activity { activity_id });
                assert_eq!(payload.xp_awarded, 80);
                assert_eq!(payload.gems_awarded, 15);
                assert_eq!(payload.level_after, 1);
            }
            other => panic!("expected RewardGranted, got {other:?}"),
        }
    }

    #[test]
    fn test_grant_reward_pays_each_source_once() {
        // Arrange
        let mut progress = enrolled(Uuid::new_v4());
        let source = RewardSource::Activity {
            activity_id: Uuid::new_v4(),
        };
        progress
            .grant_reward(
                source,
                75.0,
                100.0,
                BaseReward { xp: 80, gems: 16 },
                Uuid::new_v4(),
                &clock_on(2),
            )
            .unwrap();
        commit(&mut progress);

        // Act
        let repeat = progress
            .grant_reward(
                source,
                100.0,
                100.0,
                BaseReward { xp: 80, gems: 16 },
                Uuid::new_v4(),
                &clock_on(3),
            )
            .unwrap();

        // Assert
        assert!(progress.uncommitted_events().is_empty());
        assert_eq!(repeat.xp_awarded, 60);
        assert_eq!(repeat.gems_awarded, 12);
        assert_eq!(repeat.state.xp, 60);
        assert_eq!(progress.state().gems, 12);
    }

    #[test]
    fn test_grant_reward_requires_enrollment() {
        // Arrange
        let student_id = Uuid::new_v4();
        let mut progress = StudentProgress::new(student_id);

        // Act
        let result = progress.grant_reward(
            RewardSource::GameSession {
                session_id: Uuid::new_v4(),
            },
            10.0,
            10.0,
            BaseReward { xp: 100, gems: 20 },
            Uuid::new_v4(),
            &clock_on(2),
        );

        // Assert
        assert_eq!(result.unwrap_err(), DomainError::AggregateNotFound(student_id));
    }

    #[test]
    fn test_grant_reward_rejects_negative_score() {
        let mut progress = enrolled(Uuid::new_v4());

        let result = progress.grant_reward(
            RewardSource::GameSession {
                session_id: Uuid::new_v4(),
            },
            -1.0,
            10.0,
            BaseReward { xp: 100, gems: 20 },
            Uuid::new_v4(),
            &clock_on(2),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_replayed_rewards_rebuild_level() {
        // Arrange
        let student_id = Uuid::new_v4();
        let mut progress = StudentProgress::new(student_id);
        progress
            .enroll("Asha".to_owned(), Uuid::new_v4(), &clock_on(1))
            .unwrap();
        for _ in 0..2 {
            progress
                .grant_reward(
                    RewardSource::GameSession {
                        session_id: Uuid::new_v4(),
                    },
                    1.0,
                    1.0,
                    BaseReward { xp: 300, gems: 10 },
                    Uuid::new_v4(),
                    &clock_on(2),
                )
                .unwrap();
        }
        let stored = progress.pending_stored_events();

        // Act
        let rebuilt = replay(StudentProgress::new(student_id), &stored).unwrap();

        // Assert
        assert_eq!(rebuilt.version(), 3);
        assert_eq!(rebuilt.state(), progress.state());
        assert_eq!(rebuilt.state().xp, 600);
        assert_eq!(rebuilt.state().gems, 20);
        assert_eq!(rebuilt.state().level, 2);
    }

    #[test]
    fn test_record_login_first_time_starts_streak() {
        // Arrange
        let mut progress = enrolled(Uuid::new_v4());

        // Act
        let state = progress.record_login(Uuid::new_v4(), &clock_on(3)).unwrap();

        // Assert
        assert_eq!(state.streak, 1);
        assert_eq!(state.last_active_date, NaiveDate::from_ymd_opt(2026, 3, 3));

        let events = progress.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), STREAK_UPDATED_EVENT_TYPE);
        match &events[0].kind {
            ProgressEventKind::StreakUpdated(payload) => {
                assert_eq!(payload.transition, StreakTransition::Reset);
                assert_eq!(payload.streak, 1);
            }
            other => panic!("expected StreakUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_record_login_on_consecutive_days_increments() {
        let mut progress = enrolled(Uuid::new_v4());
        progress.record_login(Uuid::new_v4(), &clock_on(3)).unwrap();
        commit(&mut progress);

        let state = progress.record_login(Uuid::new_v4(), &clock_on(4)).unwrap();

        assert_eq!(state.streak, 2);
    }

    #[test]
    fn test_record_login_same_day_produces_no_event() {
        // Arrange
        let mut progress = enrolled(Uuid::new_v4());
        progress.record_login(Uuid::new_v4(), &clock_on(3)).unwrap();
        commit(&mut progress);

        // Act
        let state = progress.record_login(Uuid::new_v4(), &clock_on(3)).unwrap();

        // Assert
        assert_eq!(state.streak, 1);
        assert!(progress.uncommitted_events().is_empty());
    }

    #[test]
    fn test_correct_experience_lowers_level() {
        // Arrange
        let mut progress = enrolled(Uuid::new_v4());
        progress
            .grant_reward(
                RewardSource::GameSession {
                    session_id: Uuid::new_v4(),
                },
                1.0,
                1.0,
                BaseReward { xp: 1_300, gems: 0 },
                Uuid::new_v4(),
                &clock_on(2),
            )
            .unwrap();
        commit(&mut progress);
        assert_eq!(progress.state().level, 3);

        // Act
        let state = progress
            .correct_experience(400, "duplicate grading".to_owned(), Uuid::new_v4(), &clock_on(5))
            .unwrap();

        // Assert
        assert_eq!(state.xp, 400);
        assert_eq!(state.level, 1);
        assert_eq!(
            progress.uncommitted_events()[0].event_type(),
            EXPERIENCE_CORRECTED_EVENT_TYPE
        );
    }

    #[test]
    fn test_correct_experience_rejects_blank_reason() {
        let mut progress = enrolled(Uuid::new_v4());

        let result = progress.correct_experience(10, "   ".to_owned(), Uuid::new_v4(), &clock_on(5));

        match result.unwrap_err() {
            DomainError::Validation(msg) => {
                assert_eq!(msg, "correction reason must not be empty");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
