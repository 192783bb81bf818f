use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-disk status values are fixed by the file format the original tool wrote
/// ("Aguardando" etc.), so existing ticket files keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "Aguardando")]
    Waiting,
    #[serde(rename = "Em andamento")]
    InProgress,
    #[serde(rename = "Finalizado")]
    Done,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Waiting => write!(f, "WAITING"),
            Status::InProgress => write!(f, "IN PROGRESS"),
            Status::Done => write!(f, "DONE"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket `{0}` already exists")]
    DuplicateId(String),

    #[error("could not find ticket `{0}`")]
    NotFound(String),

    #[error("ticket id must not be empty")]
    InvalidId,

    #[error("cannot {action} ticket `{id}` while it is {status}")]
    InvalidTransition {
        id: String,
        status: Status,
        action: &'static str,
    },

    #[error("{context}: {message}")]
    Persistence { context: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    #[serde(rename = "descricao")]
    pub description: String,
    pub status: Status,
    #[serde(rename = "tempo_gasto")]
    pub elapsed_secs: f64,
    #[serde(rename = "inicio")]
    pub started_at: Option<f64>,
}

impl Ticket {
    pub fn new(id: String, description: String) -> Self {
        Self {
            id,
            description,
            status: Status::Waiting,
            elapsed_secs: 0.0,
            started_at: None,
        }
    }

    /// Open a work session. Only valid from `Waiting`.
    pub fn start(&mut self, now: f64) -> Result<(), TicketError> {
        if self.status != Status::Waiting {
            return Err(self.invalid_transition("start"));
        }

        self.status = Status::InProgress;
        self.started_at = Some(now);

        Ok(())
    }

    /// Close the open session, folding its duration into `elapsed_secs`.
    /// Only valid from `InProgress`.
    pub fn stop(&mut self, now: f64) -> Result<(), TicketError> {
        if self.status != Status::InProgress {
            return Err(self.invalid_transition("stop"));
        }

        self.close_session(now);
        self.status = Status::Waiting;

        Ok(())
    }

    /// Mark the ticket done from any state. An open session is closed first
    /// through the same accounting as `stop`, so no time is lost. Calling
    /// this on a `Done` ticket changes nothing.
    pub fn finish(&mut self, now: f64) {
        if self.status == Status::InProgress {
            self.close_session(now);
        }

        self.status = Status::Done;
    }

    fn close_session(&mut self, now: f64) {
        if let Some(started_at) = self.started_at.take() {
            // Clamp so a clock that moved backwards cannot shrink the total.
            self.elapsed_secs += (now - started_at).max(0.0);
        }
    }

    fn invalid_transition(&self, action: &'static str) -> TicketError {
        TicketError::InvalidTransition {
            id: self.id.clone(),
            status: self.status,
            action,
        }
    }
}

/// Renders accumulated seconds as `HHh MMm SSs` for the ticket tables.
pub fn format_elapsed(elapsed_secs: f64) -> String {
    let total = elapsed_secs.max(0.0) as u64;
    format!("{:02}h {:02}m {:02}s", total / 3600, (total % 3600) / 60, total % 60)
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Action {
    NavigateToTicketDetail { ticket_id: String },
    NavigateToPreviousPage,
    CreateTicket,
    StartTicket { ticket_id: String },
    StopTicket { ticket_id: String },
    FinishTicket { ticket_id: String },
    Exit,
}
