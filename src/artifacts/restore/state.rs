use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreState {
    Requested,
    Validating,
    Checkout,
    Committing,
    Done,
    Failed,
}

impl RestoreState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RestoreState::Done | RestoreState::Failed)
    }

    /// `Failed` is reachable from every non-terminal state; everything else
    /// moves strictly forward.
    pub fn can_advance_to(&self, next: RestoreState) -> bool {
        use RestoreState::*;

        matches!(
            (self, next),
            (Requested, Validating)
                | (Validating, Checkout)
                | (Checkout, Committing)
                | (Committing, Done)
        ) || (!self.is_terminal() && next == Failed)
    }
}

impl fmt::Display for RestoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreState::Requested => "requested",
            RestoreState::Validating => "validating",
            RestoreState::Checkout => "checkout",
            RestoreState::Committing => "committing",
            RestoreState::Done => "done",
            RestoreState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub state: RestoreState,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Ordered record of the states one restore request went through.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreTrail {
    path: String,
    transitions: Vec<Transition>,
}

impl RestoreTrail {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        info!(path = %path, state = %RestoreState::Requested, "restore");

        RestoreTrail {
            path,
            transitions: vec![Transition {
                state: RestoreState::Requested,
                at: Utc::now(),
                detail: None,
            }],
        }
    }

    pub fn current(&self) -> RestoreState {
        self.transitions
            .last()
            .map_or(RestoreState::Requested, |t| t.state)
    }

    /// Records a transition; illegal moves are ignored and reported.
    pub fn advance(&mut self, next: RestoreState, detail: Option<String>) -> bool {
        let current = self.current();
        if !current.can_advance_to(next) {
            warn!(path = %self.path, from = %current, to = %next, "illegal restore transition");
            return false;
        }

        match &detail {
            Some(detail) => info!(path = %self.path, state = %next, detail = %detail, "restore"),
            None => info!(path = %self.path, state = %next, "restore"),
        }
        self.transitions.push(Transition {
            state: next,
            at: Utc::now(),
            detail,
        });

        true
    }

    pub fn fail(&mut self, reason: impl fmt::Display) {
        self.advance(RestoreState::Failed, Some(reason.to_string()));
    }

    pub fn states(&self) -> Vec<RestoreState> {
        self.transitions.iter().map(|t| t.state).collect()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<Transition> {
        self.transitions
    }
}
