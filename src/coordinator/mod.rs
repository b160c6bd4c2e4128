mod coordinator;
mod error;
mod state_machine;
mod types;

pub use coordinator::{ClientCoordinator, CoordinatorHandle};
pub use error::{ControllerError, ControllerResult};
pub use state_machine::{
    reduce, validate_address, validate_offer, validate_progress, validate_send, validate_target,
    TransferClientController,
};
pub use types::{
    ControllerEvent, Decision, Direction, Effect, KnownPeerList, Notice, NoticeLevel, OfferState,
    OutboundSendRequest, PeerAddress, ProgressDisplay, ProgressEvent, TransferOffer, UserAction,
    ViewState,
};
