use crate::api::{ApiError, ApiResult, PushChannel, PushMessage, PushReceiver, PushSender, RestClient};
use crate::config::ClientConfig;
use crate::coordinator::error::{ControllerError, ControllerResult};
use crate::coordinator::state_machine::TransferClientController;
use crate::coordinator::types::{ControllerEvent, Effect, Notice, UserAction, ViewState};
use crate::metrics::recorder::{self, RequestTimer};
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

enum Inbound {
    Event(ControllerEvent),
    Shutdown,
}

/// Front-end side of a running [`ClientCoordinator`].
#[derive(Clone)]
pub struct CoordinatorHandle {
    inbound: mpsc::UnboundedSender<Inbound>,
    view: watch::Receiver<ViewState>,
}

impl CoordinatorHandle {
    /// Queue a user action. Fails only once the coordinator has stopped.
    pub fn dispatch(&self, action: UserAction) -> ControllerResult<()> {
        self.inbound
            .send(Inbound::Event(ControllerEvent::User(action)))
            .map_err(|_| ControllerError::Stopped)
    }

    pub fn shutdown(&self) {
        let _ = self.inbound.send(Inbound::Shutdown);
    }

    /// Latest published view
    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }
}

/// Drives a [`TransferClientController`] against the backend.
///
/// User actions, push notifications and request completions all enter one
/// queue; a single task drains it, so the controller and the published view
/// have exactly one writer. Requests run on their own tasks and report back
/// through the same queue, which keeps notifications flowing while a connect
/// or send is outstanding. Decisions go out through a separate writer task.
pub struct ClientCoordinator {
    controller: TransferClientController,
    rest: RestClient,
    decisions: Option<mpsc::UnboundedSender<bool>>,
    decision_writer: Option<JoinHandle<()>>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    view_tx: watch::Sender<ViewState>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl ClientCoordinator {
    /// Build a coordinator plus its handle and the stream of user-visible notices.
    pub fn new(
        config: ClientConfig,
    ) -> ApiResult<(Self, CoordinatorHandle, mpsc::UnboundedReceiver<Notice>)> {
        let rest = RestClient::new(config)?;
        let controller = TransferClientController::new();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(controller.state().clone());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let handle = CoordinatorHandle {
            inbound: inbound_tx.clone(),
            view: view_rx,
        };

        let coordinator = Self {
            controller,
            rest,
            decisions: None,
            decision_writer: None,
            inbound_tx,
            inbound_rx,
            view_tx,
            notices: notice_tx,
        };

        Ok((coordinator, handle, notice_rx))
    }

    /// Run until [`CoordinatorHandle::shutdown`] is called.
    pub async fn run(mut self) {
        self.open_push_channel().await;

        let effects = self.controller.start();
        self.execute(effects);
        self.publish();

        while let Some(inbound) = self.inbound_rx.recv().await {
            let event = match inbound {
                Inbound::Event(event) => event,
                Inbound::Shutdown => break,
            };

            if matches!(event, ControllerEvent::PushChannelClosed(_)) {
                // ends the writer task, which closes its half of the socket
                self.decisions = None;
            }

            let effects = self.controller.handle(event);
            self.execute(effects);
            self.publish();
        }

        self.decisions = None;
        if let Some(writer) = self.decision_writer.take() {
            let _ = writer.await;
        }
        tracing::info!("Coordinator stopped");
    }

    async fn open_push_channel(&mut self) {
        let opened = match self.rest.config().push_url() {
            Ok(url) => PushChannel::connect(&url).await.map(PushChannel::split),
            Err(e) => Err(e),
        };

        let event = match opened {
            Ok((sender, receiver)) => {
                let (decisions, writer) = spawn_decision_writer(sender, self.notices.clone());
                self.decisions = Some(decisions);
                self.decision_writer = Some(writer);
                spawn_push_reader(receiver, self.inbound_tx.clone());
                ControllerEvent::PushChannelOpened
            }
            Err(e) => {
                tracing::warn!("Notification channel unavailable: {}", e);
                ControllerEvent::PushChannelClosed(Some(e.to_string()))
            }
        };

        let effects = self.controller.handle(event);
        self.execute(effects);
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::EmitDecision { accept } => self.emit_decision(accept),
                Effect::RequestConnect(address) => {
                    let rest = self.rest.clone();
                    self.spawn_request(
                        "connect",
                        async move { rest.connect(&address).await.map(|r| r.message) },
                        ControllerEvent::ConnectCompleted,
                    );
                }
                Effect::RequestPeerList { seq } => {
                    let rest = self.rest.clone();
                    self.spawn_request(
                        "list_peers",
                        async move { rest.list_peers().await },
                        move |result| ControllerEvent::PeersLoaded { seq, result },
                    );
                }
                Effect::RequestSend(request) => {
                    let rest = self.rest.clone();
                    self.spawn_request(
                        "send_file",
                        async move { rest.send_file(&request).await.map(|r| r.message) },
                        ControllerEvent::SendCompleted,
                    );
                }
                Effect::Notify(notice) => self.notify(notice),
            }
        }
    }

    /// Hand a decision to the writer task without waiting on the socket.
    fn emit_decision(&self, accept: bool) {
        let queued = match &self.decisions {
            Some(decisions) => decisions.send(accept).map_err(|_| ApiError::ChannelClosed),
            None => Err(ApiError::ChannelClosed),
        };

        if let Err(e) = queued {
            tracing::warn!("File decision not delivered: {}", e);
            self.notify(Notice::error(format!("decision not delivered: {e}")));
        }
    }

    /// Run a request on its own task; its result re-enters the queue via `complete`.
    fn spawn_request<F, T, C>(&self, kind: &'static str, request: F, complete: C)
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(Result<T, String>) -> ControllerEvent + Send + 'static,
    {
        let inbound = self.inbound_tx.clone();

        tokio::spawn(async move {
            let timer = RequestTimer::start(kind);
            let result = request.await;
            timer.finish(result.is_ok());

            let result = result.map_err(|e| {
                tracing::warn!("{} request failed: {}", kind, e);
                e.to_string()
            });
            let _ = inbound.send(Inbound::Event(complete(result)));
        });
    }

    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::debug!("notice (error): {}", notice.text);
        } else {
            tracing::debug!("notice: {}", notice.text);
        }
        let _ = self.notices.send(notice);
    }

    fn publish(&self) {
        let next = self.controller.state();
        self.view_tx.send_if_modified(|current| {
            if current != next {
                *current = next.clone();
                true
            } else {
                false
            }
        });
    }
}

/// Owns the sending half of the push channel and writes decisions in order.
fn spawn_decision_writer(
    mut sender: PushSender,
    notices: mpsc::UnboundedSender<Notice>,
) -> (mpsc::UnboundedSender<bool>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<bool>();

    let writer = tokio::spawn(async move {
        while let Some(accept) = rx.recv().await {
            match sender.send_decision(accept).await {
                Ok(()) => {
                    recorder::record_decision_sent(accept);
                    tracing::info!("Sent file decision (accept: {})", accept);
                }
                Err(e) => {
                    tracing::warn!("File decision not delivered: {}", e);
                    let _ = notices.send(Notice::error(format!("decision not delivered: {e}")));
                }
            }
        }

        if let Err(e) = sender.close().await {
            tracing::debug!("Closing notification channel: {}", e);
        }
    });

    (tx, writer)
}

fn spawn_push_reader(mut receiver: PushReceiver, inbound: mpsc::UnboundedSender<Inbound>) {
    tokio::spawn(async move {
        let reason = loop {
            let event = match receiver.next_message().await {
                Some(Ok(PushMessage::FileOffer(offer))) => ControllerEvent::OfferReceived(offer),
                Some(Ok(PushMessage::ProgressUpdate(progress))) => {
                    ControllerEvent::ProgressReceived(progress)
                }
                Some(Err(e)) => break Some(e.to_string()),
                None => break None,
            };

            if inbound.send(Inbound::Event(event)).is_err() {
                return;
            }
        };

        tracing::info!("Notification channel ended");
        let _ = inbound.send(Inbound::Event(ControllerEvent::PushChannelClosed(reason)));
    });
}
