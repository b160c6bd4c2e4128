use crate::coordinator::error::{ControllerError, ControllerResult};
use crate::coordinator::types::{
    ControllerEvent, Decision, Direction, Effect, KnownPeerList, Notice, OfferState, OutboundSendRequest,
    PeerAddress, ProgressEvent, TransferOffer, UserAction, ViewState,
};
use crate::metrics::recorder;

const DEFAULT_CONNECT_MESSAGE: &str = "connected";
const DEFAULT_SEND_MESSAGE: &str = "file sent";

/// Applies one event to `state` and returns the effects to execute.
///
/// Every mutation of the view goes through here.
pub fn reduce(mut state: ViewState, event: ControllerEvent) -> (ViewState, Vec<Effect>) {
    let effects = apply(&mut state, event);
    (state, effects)
}

/// Owns the view state of one client session.
#[derive(Debug, Default)]
pub struct TransferClientController {
    state: ViewState,
}

impl TransferClientController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view state
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Effects to run once when the session opens.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![request_peer_list(&mut self.state)]
    }

    pub fn handle(&mut self, event: ControllerEvent) -> Vec<Effect> {
        apply(&mut self.state, event)
    }
}

/// Checks the connect input without touching the network.
pub fn validate_address(input: &str) -> ControllerResult<PeerAddress> {
    PeerAddress::parse(input).ok_or(ControllerError::MissingAddress)
}

/// Resolves a target choice against the listed peers.
pub fn validate_target(state: &ViewState, input: &str) -> ControllerResult<PeerAddress> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ControllerError::MissingTarget);
    }
    state
        .peers
        .iter()
        .find(|peer| peer.as_str() == input)
        .cloned()
        .ok_or_else(|| ControllerError::UnknownTarget(input.to_string()))
}

/// Checks that a file and a target are both selected.
pub fn validate_send(state: &ViewState) -> ControllerResult<OutboundSendRequest> {
    let file = state.selected_file.clone().ok_or(ControllerError::MissingFile)?;
    let target = state
        .selected_target
        .clone()
        .ok_or(ControllerError::MissingTarget)?;

    Ok(OutboundSendRequest { file, target })
}

pub fn validate_offer(offer: &TransferOffer) -> ControllerResult<()> {
    if offer.filename.trim().is_empty() {
        return Err(ControllerError::InvalidOffer("empty filename".into()));
    }
    Ok(())
}

pub fn validate_progress(event: &ProgressEvent) -> ControllerResult<()> {
    if event.total == 0 {
        return Err(ControllerError::InvalidProgress(format!(
            "{} update with zero total",
            event.direction.label()
        )));
    }
    Ok(())
}

fn apply(state: &mut ViewState, event: ControllerEvent) -> Vec<Effect> {
    match event {
        ControllerEvent::OfferReceived(offer) => on_offer(state, offer),
        ControllerEvent::ProgressReceived(progress) => on_progress(state, progress),
        ControllerEvent::User(action) => on_user_action(state, action),
        ControllerEvent::ConnectCompleted(Ok(message)) => {
            let text = message.unwrap_or_else(|| DEFAULT_CONNECT_MESSAGE.to_string());
            vec![Effect::Notify(Notice::info(text)), request_peer_list(state)]
        }
        ControllerEvent::ConnectCompleted(Err(reason)) => {
            vec![Effect::Notify(Notice::error(format!("connect failed: {reason}")))]
        }
        ControllerEvent::PeersLoaded { seq, result } => on_peers_loaded(state, seq, result),
        ControllerEvent::SendCompleted(Ok(message)) => {
            let text = message.unwrap_or_else(|| DEFAULT_SEND_MESSAGE.to_string());
            vec![Effect::Notify(Notice::info(text))]
        }
        ControllerEvent::SendCompleted(Err(reason)) => {
            vec![Effect::Notify(Notice::error(format!("send failed: {reason}")))]
        }
        ControllerEvent::PushChannelOpened => {
            state.push_connected = true;
            Vec::new()
        }
        ControllerEvent::PushChannelClosed(reason) => {
            let was_connected = std::mem::replace(&mut state.push_connected, false);
            let text = match reason {
                Some(reason) => format!("notification channel unavailable: {reason}"),
                None if was_connected => "notification channel closed".to_string(),
                None => "notification channel unavailable".to_string(),
            };
            vec![Effect::Notify(Notice::error(text))]
        }
    }
}

fn on_offer(state: &mut ViewState, offer: TransferOffer) -> Vec<Effect> {
    if let Err(e) = validate_offer(&offer) {
        tracing::warn!("Dropping file offer: {}", e);
        return Vec::new();
    }

    let overwrote = state.offer.is_pending();
    if let Some(previous) = state.offer.pending_offer() {
        tracing::debug!(
            "Offer for '{}' replaced by '{}' without a decision",
            previous.filename,
            offer.filename
        );
    }
    recorder::record_offer_received(overwrote);

    state.offer_seq += 1;
    state.offer = OfferState::OfferPending {
        seq: state.offer_seq,
        offer,
    };
    Vec::new()
}

fn on_progress(state: &mut ViewState, progress: ProgressEvent) -> Vec<Effect> {
    if let Err(e) = validate_progress(&progress) {
        tracing::warn!("Dropping progress update: {}", e);
        return Vec::new();
    }

    recorder::record_progress_update(progress.direction.label());
    let slot = match progress.direction {
        Direction::Send => &mut state.send_progress,
        Direction::Receive => &mut state.receive_progress,
    };
    *slot = Some(progress.into());
    Vec::new()
}

fn on_user_action(state: &mut ViewState, action: UserAction) -> Vec<Effect> {
    match action {
        UserAction::Accept => decide(state, true),
        UserAction::Reject => decide(state, false),
        UserAction::Connect { address } => match validate_address(&address) {
            Ok(address) => vec![Effect::RequestConnect(address)],
            Err(e) => rejected_locally(e),
        },
        UserAction::RefreshPeers => vec![request_peer_list(state)],
        UserAction::ChooseFile(file) => {
            state.selected_file = file;
            Vec::new()
        }
        UserAction::SelectTarget(target) => match validate_target(state, &target) {
            Ok(peer) => {
                state.selected_target = Some(peer);
                Vec::new()
            }
            Err(e) => rejected_locally(e),
        },
        UserAction::Send => match validate_send(state) {
            Ok(request) => vec![Effect::RequestSend(request)],
            Err(e) => rejected_locally(e),
        },
    }
}

/// At most one decision per pending offer; anything else is a no-op.
fn decide(state: &mut ViewState, accept: bool) -> Vec<Effect> {
    let (seq, offer) = match std::mem::take(&mut state.offer) {
        OfferState::OfferPending { seq, offer } => (seq, offer),
        other => {
            state.offer = other;
            tracing::debug!("Ignoring decision with no pending offer");
            return Vec::new();
        }
    };

    let verb = if accept { "accepted" } else { "rejected" };
    let notice = Notice::info(format!("{verb} '{}'", offer.filename));

    state.offer = OfferState::Resolved {
        seq,
        offer,
        accepted: accept,
    };
    settle(state);

    vec![Effect::EmitDecision { accept }, Effect::Notify(notice)]
}

/// No offer history is kept, so a resolved offer goes straight back to idle.
fn settle(state: &mut ViewState) {
    match std::mem::take(&mut state.offer) {
        OfferState::Resolved {
            seq,
            offer,
            accepted,
        } => {
            state.last_decision = Some(Decision {
                seq,
                filename: offer.filename,
                accepted,
            });
        }
        other => state.offer = other,
    }
}

fn request_peer_list(state: &mut ViewState) -> Effect {
    state.peers_requested += 1;
    Effect::RequestPeerList {
        seq: state.peers_requested,
    }
}

/// A completion not newer than the list on screen is discarded, failures included.
/// A failure applies nothing, so a later success of an older request still shows.
fn on_peers_loaded(
    state: &mut ViewState,
    seq: u64,
    result: Result<KnownPeerList, String>,
) -> Vec<Effect> {
    if seq <= state.peers_applied {
        tracing::debug!(
            "Discarding peer list #{} (showing #{})",
            seq,
            state.peers_applied
        );
        return Vec::new();
    }

    match result {
        Ok(peers) => {
            state.peers_applied = seq;
            replace_peers(state, peers);
            Vec::new()
        }
        Err(reason) => vec![Effect::Notify(Notice::error(format!(
            "failed to load peers: {reason}"
        )))],
    }
}

fn replace_peers(state: &mut ViewState, peers: KnownPeerList) {
    let keep = state
        .selected_target
        .as_ref()
        .filter(|target| peers.contains(target))
        .cloned();

    state.selected_target = keep.or_else(|| peers.first().cloned());
    state.peers = peers;
}

fn rejected_locally(error: ControllerError) -> Vec<Effect> {
    recorder::record_validation_failure(error.kind());
    vec![Effect::Notify(Notice::error(error.to_string()))]
}
