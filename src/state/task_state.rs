/// Task state definitions for the per-URL pipeline
///
/// A task walks `Pending → Admitted → Validating → RobotsCheck → Fetching →
/// Analyzing → Recording → Recorded(..)`. Any active stage may jump straight
/// to `Recording` when it produces a failure or skip.
use crate::crawler::FetchErrorKind;
use crate::SieveError;
use std::fmt;

/// Why a task was skipped without fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The URL failed syntactic validation
    InvalidUrl,
    /// robots.txt disallows the URL for our agent
    Disallowed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Disallowed => "disallowed",
        }
    }
}

/// Terminal outcome carried by a recorded task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOutcome {
    /// Fetched with a 2xx response and analyzed
    Success,
    /// The fetch ended in an error after retries (or immediately, if non-retryable)
    Failure(FetchErrorKind),
    /// Never fetched
    Skipped(SkipReason),
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure(kind) => write!(f, "failure({})", kind),
            Self::Skipped(reason) => write!(f, "skipped({})", reason.as_str()),
        }
    }
}

/// Represents the current state of a task in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Waiting States =====
    /// Seed accepted, waiting for a worker
    Pending,

    /// Picked up by a worker, holding an admission permit
    Admitted,

    // ===== Active States (bounded by max-concurrent) =====
    Validating,
    RobotsCheck,
    Fetching,
    Analyzing,

    // ===== Closing States =====
    /// Writing the record to the store
    Recording,

    /// Terminal
    Recorded(RecordOutcome),
}

impl TaskState {
    /// Returns true once the task has been recorded
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    /// Returns true for the stages counted against the concurrency limit
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Validating | Self::RobotsCheck | Self::Fetching | Self::Analyzing
        )
    }

    /// Checks whether moving to `next` is a legal step
    pub fn can_transition_to(&self, next: &TaskState) -> bool {
        use TaskState::*;
        match (self, next) {
            (Pending, Admitted) => true,
            (Admitted, Validating) => true,
            (Validating, RobotsCheck) => true,
            (RobotsCheck, Fetching) => true,
            (Fetching, Analyzing) => true,
            // Failures and skips short-circuit to Recording
            (Validating | RobotsCheck | Fetching | Analyzing, Recording) => true,
            (Recording, Recorded(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Admitted => "admitted",
            Self::Validating => "validating",
            Self::RobotsCheck => "robots_check",
            Self::Fetching => "fetching",
            Self::Analyzing => "analyzing",
            Self::Recording => "recording",
            Self::Recorded(_) => "recorded",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded(outcome) => write!(f, "recorded({})", outcome),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One unit of work: a seed URL moving through the pipeline
///
/// Owned by a single worker for its whole life; never shared.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// The seed exactly as given (trimmed); this is the record key
    pub url: String,

    /// Fetch attempts made so far
    pub attempt_count: u32,

    state: TaskState,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attempt_count: 0,
            state: TaskState::Pending,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Moves the task to `next`, rejecting illegal transitions
    pub fn advance(&mut self, next: TaskState) -> Result<(), SieveError> {
        if !self.state.can_transition_to(&next) {
            return Err(SieveError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(url = %crate::url::sanitize_for_log(&self.url), from = %self.state, to = %next, "task transition");
        self.state = next;
        Ok(())
    }
}
