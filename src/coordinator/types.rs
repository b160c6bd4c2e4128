use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A connect or send target in `host:port` form.
///
/// The backend owns parsing and validation; the client only refuses blank input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn host(&self) -> Option<&str> {
        self.0.rsplit_once(':').map(|(host, _)| host)
    }

    pub fn port(&self) -> Option<u16> {
        self.0
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Peers as last returned by the backend, in display order.
pub type KnownPeerList = Vec<PeerAddress>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Send,
    Receive,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Send => "send",
            Direction::Receive => "receive",
        }
    }
}

/// Proposed inbound transfer, as pushed in a `file_offer` notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferOffer {
    pub filename: String,
    pub total_chunks: u64,
    pub file_hash: String,
}

/// Body of a `progress_update` notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    #[serde(rename = "mode")]
    pub direction: Direction,
    pub done: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDisplay {
    pub done: u64,
    pub total: u64,
}

impl From<ProgressEvent> for ProgressDisplay {
    fn from(event: ProgressEvent) -> Self {
        Self {
            done: event.done,
            total: event.total,
        }
    }
}

/// Lifecycle of the single inbound offer slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OfferState {
    #[default]
    Idle,
    OfferPending {
        seq: u64,
        offer: TransferOffer,
    },
    Resolved {
        seq: u64,
        offer: TransferOffer,
        accepted: bool,
    },
}

impl OfferState {
    pub fn is_pending(&self) -> bool {
        matches!(self, OfferState::OfferPending { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OfferState::Idle)
    }

    pub fn pending_offer(&self) -> Option<&TransferOffer> {
        match self {
            OfferState::OfferPending { offer, .. } => Some(offer),
            _ => None,
        }
    }
}

/// Outcome of the most recent offer, kept for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub seq: u64,
    pub filename: String,
    pub accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Everything a front end needs to draw the client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub offer: OfferState,
    /// Number of offers received this session; identifies the current episode.
    pub offer_seq: u64,
    pub last_decision: Option<Decision>,
    pub send_progress: Option<ProgressDisplay>,
    pub receive_progress: Option<ProgressDisplay>,
    pub peers: KnownPeerList,
    /// Number of the most recent peer-list request issued.
    pub peers_requested: u64,
    /// Number of the request whose result `peers` currently shows.
    pub peers_applied: u64,
    pub selected_target: Option<PeerAddress>,
    pub selected_file: Option<PathBuf>,
    pub push_connected: bool,
}

impl ViewState {
    pub fn progress(&self, direction: Direction) -> Option<ProgressDisplay> {
        match direction {
            Direction::Send => self.send_progress,
            Direction::Receive => self.receive_progress,
        }
    }
}

/// Single-shot upload of one local file to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSendRequest {
    pub file: PathBuf,
    pub target: PeerAddress,
}

/// Intent coming from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Connect { address: String },
    RefreshPeers,
    ChooseFile(Option<PathBuf>),
    SelectTarget(String),
    Send,
    Accept,
    Reject,
}

/// Input to the controller. Request completions carry the backend message on
/// success and the failure reason text on error.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    User(UserAction),
    OfferReceived(TransferOffer),
    ProgressReceived(ProgressEvent),
    ConnectCompleted(Result<Option<String>, String>),
    PeersLoaded {
        seq: u64,
        result: Result<KnownPeerList, String>,
    },
    SendCompleted(Result<Option<String>, String>),
    PushChannelOpened,
    PushChannelClosed(Option<String>),
}

/// Output of the controller, executed by whoever drives it.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    EmitDecision { accept: bool },
    RequestConnect(PeerAddress),
    RequestPeerList { seq: u64 },
    RequestSend(OutboundSendRequest),
    Notify(Notice),
}

impl Effect {
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Effect::RequestConnect(_) | Effect::RequestPeerList { .. } | Effect::RequestSend(_)
        )
    }
}
