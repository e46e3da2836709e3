use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The step of a negotiation command that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    CreateOffer,
    CreateAnswer,
    ApplyLocal,
    ApplyRemote,
    ReadLocal,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NegotiationStep::CreateOffer => "create-offer",
            NegotiationStep::CreateAnswer => "create-answer",
            NegotiationStep::ApplyLocal => "apply-local",
            NegotiationStep::ApplyRemote => "apply-remote",
            NegotiationStep::ReadLocal => "read-local",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to start transport engine: {0}")]
    Construction(#[source] anyhow::Error),

    #[error("negotiation failed at {step}: {source}")]
    Negotiation {
        step: NegotiationStep,
        #[source]
        source: anyhow::Error,
    },

    #[error("ice candidate rejected: {0}")]
    Candidate(#[source] anyhow::Error),

    #[error("data channel '{label}' refused: {source}")]
    Channel {
        label: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("connection is closed")]
    Closed,
}

impl Error {
    pub(crate) fn negotiation(step: NegotiationStep) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Error::Negotiation { step, source }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    pub fn negotiation_step(&self) -> Option<NegotiationStep> {
        match self {
            Error::Negotiation { step, .. } => Some(*step),
            _ => None,
        }
    }
}
