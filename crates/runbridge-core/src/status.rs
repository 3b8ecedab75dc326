//! Run lifecycle status

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Run status
///
/// The wire-visible strings are exactly the variant names
/// (`"Queued"`, `"Running"`, `"Completed"`, `"Failed"`, `"Canceled"`).
/// Transitions only move forward: Queued -> Running -> terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum RunStatus {
    /// Run has been created but execution has not started
    Queued,
    /// Run is currently executing
    Running,
    /// Run finished successfully
    Completed,
    /// Run finished with an error
    Failed,
    /// Run was canceled before finishing
    Canceled,
}

impl RunStatus {
    /// Check if the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Canceled
        )
    }

    /// Check whether a forward transition to `next` is allowed
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match self {
            RunStatus::Queued => matches!(
                next,
                RunStatus::Running
                    | RunStatus::Completed
                    | RunStatus::Failed
                    | RunStatus::Canceled
            ),
            RunStatus::Running => next.is_terminal(),
            // Terminal statuses never move
            RunStatus::Completed | RunStatus::Failed | RunStatus::Canceled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_strings() {
        assert_eq!(RunStatus::Completed.to_string(), "Completed");
        assert_eq!(RunStatus::Canceled.to_string(), "Canceled");
        assert_eq!(RunStatus::from_str("Queued").unwrap(), RunStatus::Queued);
        assert!(RunStatus::from_str("completed").is_err());
    }

    #[test]
    fn test_forward_transitions_only() {
        assert!(RunStatus::Queued.can_transition_to(RunStatus::Running));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Completed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Failed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Canceled));

        assert!(!RunStatus::Running.can_transition_to(RunStatus::Queued));
        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Failed.can_transition_to(RunStatus::Completed));
        assert!(!RunStatus::Canceled.can_transition_to(RunStatus::Queued));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Canceled.is_terminal());
    }
}
