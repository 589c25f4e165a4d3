//! Task record aggregate and its creation payload.

use super::{FulfilStatus, TaskDomainError, TaskId, TaskStatus, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Immutable creation payload describing what is requested and by whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    requester_id: UserId,
    title: String,
    #[serde(default)]
    description: Option<String>,
}

impl TaskDescriptor {
    /// Creates a validated descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(requester_id: UserId, title: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            requester_id,
            title: trimmed.to_owned(),
            description: None,
        })
    }

    /// Sets the free-form task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Re-checks invariants on a descriptor received over the wire.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn validated(self) -> Result<Self, TaskDomainError> {
        let description = self.description;
        let descriptor = Self::new(self.requester_id, self.title)?;
        Ok(match description {
            Some(text) => descriptor.with_description(text),
            None => descriptor,
        })
    }

    /// Returns the requester identity.
    #[must_use]
    pub const fn requester_id(&self) -> UserId {
        self.requester_id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A task that has not yet been assigned an identifier by the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    descriptor: TaskDescriptor,
    created_at: DateTime<Utc>,
}

impl NewTask {
    /// Prepares a task for its first durable write.
    #[must_use]
    pub fn new(descriptor: TaskDescriptor, clock: &impl Clock) -> Self {
        Self {
            descriptor,
            created_at: clock.utc(),
        }
    }

    /// Returns the creation payload.
    #[must_use]
    pub const fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    /// Returns the status a freshly persisted task starts in.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        TaskStatus::Creating
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Completes the record with the identifier assigned by the store.
    #[must_use]
    pub fn into_record(self, id: TaskId) -> TaskRecord {
        TaskRecord {
            id,
            status: TaskStatus::Creating,
            descriptor: self.descriptor,
            notified_responders: Vec::new(),
            candidate_responders: Vec::new(),
            chosen_responders: Vec::new(),
            fulfil_status: Vec::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Live task record.
///
/// Mutating methods validate the lifecycle before touching any field, so a
/// method that returns an error leaves the record unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    id: TaskId,
    status: TaskStatus,
    descriptor: TaskDescriptor,
    notified_responders: Vec<UserId>,
    candidate_responders: Vec<UserId>,
    chosen_responders: Vec<UserId>,
    fulfil_status: Vec<FulfilStatus>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation payload.
    #[must_use]
    pub const fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    /// Returns the requester identity.
    #[must_use]
    pub const fn requester_id(&self) -> UserId {
        self.descriptor.requester_id
    }

    /// Returns the search candidates that were notified about this task.
    #[must_use]
    pub fn notified_responders(&self) -> &[UserId] {
        &self.notified_responders
    }

    /// Returns responders who accepted, in acceptance order.
    #[must_use]
    pub fn candidate_responders(&self) -> &[UserId] {
        &self.candidate_responders
    }

    /// Returns responders chosen by the requester.
    #[must_use]
    pub fn chosen_responders(&self) -> &[UserId] {
        &self.chosen_responders
    }

    /// Returns fulfilment flags parallel to [`Self::chosen_responders`].
    #[must_use]
    pub fn fulfil_status(&self) -> &[FulfilStatus] {
        &self.fulfil_status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether every chosen responder has finished.
    #[must_use]
    pub fn is_fully_fulfilled(&self) -> bool {
        !self.fulfil_status.is_empty()
            && self
                .fulfil_status
                .iter()
                .all(|status| *status == FulfilStatus::Finished)
    }

    /// Applies the outcome of the responder search.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// still `Creating` and `outcome` is one of the search result statuses.
    pub fn record_search_outcome(
        &mut self,
        outcome: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Creating {
            return Err(self.invalid_transition(outcome));
        }
        self.transition_to(outcome, clock)
    }

    /// Remembers search candidates that were told about the task.
    ///
    /// The requester and already-notified users are skipped. Returns the
    /// users newly added, in search order.
    pub fn notify_responders(&mut self, candidates: &[UserId]) -> Vec<UserId> {
        let mut added = Vec::new();
        for candidate in candidates {
            if *candidate == self.requester_id() || self.notified_responders.contains(candidate) {
                continue;
            }
            self.notified_responders.push(*candidate);
            added.push(*candidate);
        }
        added
    }

    /// Checks that `responder` may drop the task from their own list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RequesterCannotRespond`] for the requester
    /// and [`TaskDomainError::ChosenResponderCannotDecline`] for a responder
    /// the requester already chose.
    pub fn check_decline(&self, responder: UserId) -> Result<(), TaskDomainError> {
        if responder == self.requester_id() {
            return Err(TaskDomainError::RequesterCannotRespond {
                task_id: self.id,
                requester_id: responder,
            });
        }
        if self.chosen_responders.contains(&responder) {
            return Err(TaskDomainError::ChosenResponderCannotDecline {
                task_id: self.id,
                responder_id: responder,
            });
        }
        Ok(())
    }

    /// Records that `responder` accepted the task.
    ///
    /// Returns `false` when the responder had already accepted, in which case
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task does
    /// not wait for acceptances, or
    /// [`TaskDomainError::RequesterCannotRespond`] for the requester.
    pub fn accept(
        &mut self,
        responder: UserId,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        if !self.status.can_transition_to(TaskStatus::WaitingChoose) {
            return Err(self.invalid_transition(TaskStatus::WaitingChoose));
        }
        if responder == self.requester_id() {
            return Err(TaskDomainError::RequesterCannotRespond {
                task_id: self.id,
                requester_id: responder,
            });
        }
        if self.candidate_responders.contains(&responder) {
            return Ok(false);
        }
        self.candidate_responders.push(responder);
        self.transition_to(TaskStatus::WaitingChoose, clock)?;
        Ok(true)
    }

    /// Sets the chosen responders and starts processing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// `WaitingChoose`; [`TaskDomainError::NoRespondersChosen`],
    /// [`TaskDomainError::NotACandidate`] or
    /// [`TaskDomainError::DuplicateChosenResponder`] for an invalid choice.
    pub fn choose(&mut self, chosen: &[UserId], clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::WaitingChoose {
            return Err(self.invalid_transition(TaskStatus::Processing));
        }
        self.validate_choice(chosen)?;

        self.chosen_responders = chosen.to_vec();
        self.fulfil_status = vec![FulfilStatus::Doing; chosen.len()];
        self.transition_to(TaskStatus::Processing, clock)
    }

    fn validate_choice(&self, chosen: &[UserId]) -> Result<(), TaskDomainError> {
        if chosen.is_empty() {
            return Err(TaskDomainError::NoRespondersChosen(self.id));
        }
        let mut seen = HashSet::with_capacity(chosen.len());
        for responder in chosen {
            if !self.candidate_responders.contains(responder) {
                return Err(TaskDomainError::NotACandidate {
                    task_id: self.id,
                    responder_id: *responder,
                });
            }
            if !seen.insert(*responder) {
                return Err(TaskDomainError::DuplicateChosenResponder {
                    task_id: self.id,
                    responder_id: *responder,
                });
            }
        }
        Ok(())
    }

    /// Marks `responder` as finished and completes the task once every chosen
    /// responder has finished.
    ///
    /// Returns `false` when the call changes nothing: the responder is not
    /// chosen or has already finished.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// neither `Processing` nor `Fulfilled`.
    pub fn fulfil(
        &mut self,
        responder: UserId,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        match self.status {
            TaskStatus::Processing => {}
            TaskStatus::Fulfilled => return Ok(false),
            _ => return Err(self.invalid_transition(TaskStatus::Fulfilled)),
        }

        let slot = self
            .chosen_responders
            .iter()
            .zip(self.fulfil_status.iter_mut())
            .find(|(chosen, status)| **chosen == responder && **status == FulfilStatus::Doing)
            .map(|(_, status)| status);
        let Some(status) = slot else {
            return Ok(false);
        };
        *status = FulfilStatus::Finished;

        if self.is_fully_fulfilled() {
            self.transition_to(TaskStatus::Fulfilled, clock)?;
        } else {
            self.touch(clock);
        }
        Ok(true)
    }

    /// Returns notified or accepting users the requester did not choose.
    #[must_use]
    pub fn unchosen_responders(&self) -> Vec<UserId> {
        let mut unchosen = Vec::new();
        for user in self
            .notified_responders
            .iter()
            .chain(self.candidate_responders.iter())
        {
            if !self.chosen_responders.contains(user) && !unchosen.contains(user) {
                unchosen.push(*user);
            }
        }
        unchosen
    }

    /// Returns every user that may reference this task in a reverse index.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        let mut users = vec![self.requester_id()];
        for user in self
            .notified_responders
            .iter()
            .chain(self.candidate_responders.iter())
            .chain(self.chosen_responders.iter())
        {
            if !users.contains(user) {
                users.push(*user);
            }
        }
        users
    }

    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(target));
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    const fn invalid_transition(&self, target: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidStateTransition {
            task_id: self.id,
            from: self.status,
            to: target,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
