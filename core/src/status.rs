//! Ticket status derivation.
//!
//! A ticket never stores its own status. Each item on the ticket carries a
//! [`MotiveStatus`], and the ticket-level [`TicketStatus`] is recomputed from
//! the multiset of those values whenever it is needed.
//!
//! # Precedence
//!
//! ```text
//! no items                         → SEM_ITENS
//! only RESOLVIDO / CANCELADO       → RESOLVIDO
//! any EM_ANDAMENTO                 → EM_ANDAMENTO
//! any ABERTO                       → ABERTO
//! any AGUARDANDO                   → AGUARDANDO
//! anything else (unknown labels)   → ABERTO
//! ```

use crate::client::ClientId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a single ticket item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotiveStatus {
    /// Open, nobody has picked it up yet
    Aberto,
    /// Someone is actively working on it
    EmAndamento,
    /// Blocked on an external party
    Aguardando,
    /// Resolved
    Resolvido,
    /// Cancelled
    Cancelado,
}

impl MotiveStatus {
    /// All statuses, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Aberto,
        Self::EmAndamento,
        Self::Aguardando,
        Self::Resolvido,
        Self::Cancelado,
    ];

    /// Wire label of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aberto => "ABERTO",
            Self::EmAndamento => "EM_ANDAMENTO",
            Self::Aguardando => "AGUARDANDO",
            Self::Resolvido => "RESOLVIDO",
            Self::Cancelado => "CANCELADO",
        }
    }

    /// Whether the item no longer needs any work.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolvido | Self::Cancelado)
    }
}

impl fmt::Display for MotiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a label is not a known [`MotiveStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown motive status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for MotiveStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(label))
            .ok_or_else(|| UnknownStatus(label.to_string()))
    }
}

/// Overall status of a ticket, derived from its items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    /// At least one open item and nothing in progress
    Aberto,
    /// At least one item in progress
    EmAndamento,
    /// Only awaiting items left (besides terminal ones)
    Aguardando,
    /// Every item is resolved or cancelled
    Resolvido,
    /// Never produced by derivation; kept so stored labels round-trip
    Cancelado,
    /// The ticket has no items
    SemItens,
}

impl TicketStatus {
    /// Wire label of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aberto => "ABERTO",
            Self::EmAndamento => "EM_ANDAMENTO",
            Self::Aguardando => "AGUARDANDO",
            Self::Resolvido => "RESOLVIDO",
            Self::Cancelado => "CANCELADO",
            Self::SemItens => "SEM_ITENS",
        }
    }

    /// Whether the ticket is closed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolvido)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which statuses occur at least once. Multiplicity and order are irrelevant
/// to derivation, so this is all the algorithm looks at.
#[derive(Clone, Copy, Debug, Default)]
struct Seen {
    any: bool,
    aberto: bool,
    em_andamento: bool,
    aguardando: bool,
    non_terminal_or_unknown: bool,
}

impl Seen {
    fn record(&mut self, status: Option<MotiveStatus>) {
        self.any = true;
        match status {
            Some(MotiveStatus::Aberto) => self.aberto = true,
            Some(MotiveStatus::EmAndamento) => self.em_andamento = true,
            Some(MotiveStatus::Aguardando) => self.aguardando = true,
            Some(MotiveStatus::Resolvido | MotiveStatus::Cancelado) => return,
            None => {},
        }
        self.non_terminal_or_unknown = true;
    }

    const fn resolve(self) -> TicketStatus {
        if !self.any {
            TicketStatus::SemItens
        } else if !self.non_terminal_or_unknown {
            TicketStatus::Resolvido
        } else if self.em_andamento {
            TicketStatus::EmAndamento
        } else if self.aberto {
            TicketStatus::Aberto
        } else if self.aguardando {
            TicketStatus::Aguardando
        } else {
            TicketStatus::Aberto
        }
    }
}

/// Derive the overall ticket status from its item statuses.
///
/// Total and order-independent: the result only depends on which statuses
/// appear, never on their order or count.
///
/// # Example
///
/// ```
/// use atendimentos_core::status::{derive_status, MotiveStatus, TicketStatus};
///
/// let status = derive_status([MotiveStatus::Resolvido, MotiveStatus::EmAndamento]);
/// assert_eq!(status, TicketStatus::EmAndamento);
/// assert_eq!(derive_status([]), TicketStatus::SemItens);
/// ```
#[must_use]
pub fn derive_status<I>(statuses: I) -> TicketStatus
where
    I: IntoIterator<Item = MotiveStatus>,
{
    let mut seen = Seen::default();
    for status in statuses {
        seen.record(Some(status));
    }
    seen.resolve()
}

/// Derive the ticket status from raw status labels, as read from storage.
///
/// Unrecognized labels count as items that are neither terminal nor any known
/// active state. A ticket whose only non-terminal labels are unrecognized
/// falls back to `ABERTO`.
#[must_use]
pub fn derive_status_from_labels<'a, I>(labels: I) -> TicketStatus
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = Seen::default();
    for label in labels {
        let parsed = label.parse::<MotiveStatus>().ok();
        if parsed.is_none() {
            tracing::debug!(label, "Unrecognized motive status label");
        }
        seen.record(parsed);
    }
    seen.resolve()
}

/// A single item (motive) on a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketItem {
    /// Why the client reached out
    pub motive: String,
    /// Item lifecycle state
    pub status: MotiveStatus,
}

/// A support ticket for one client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket identifier
    pub id: Uuid,
    /// The client this ticket belongs to
    pub client_id: ClientId,
    /// Organizational unit the ticket is classified under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unidade: Option<String>,
    /// Items on the ticket
    #[serde(default)]
    pub items: Vec<TicketItem>,
}

impl Ticket {
    /// Current ticket status, recomputed from the items.
    #[must_use]
    pub fn status(&self) -> TicketStatus {
        derive_status(self.items.iter().map(|item| item.status))
    }
}
