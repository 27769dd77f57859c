//! Hub control loop and client registry.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::Notification;

/// Hub tuning knobs.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of each client's bounded outbound queue. A broadcast that
    /// finds the queue full evicts the client instead of waiting, so the
    /// drop-on-full back-pressure policy is explicit configuration rather
    /// than an accident of a non-blocking send.
    pub client_queue_capacity: usize,
    /// Capacity of the control-loop command channel.
    pub command_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            client_queue_capacity: 32,
            command_queue_capacity: 256,
        }
    }
}

/// Errors surfaced by hub handle operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The control loop has shut down.
    #[error("hub is not running")]
    Closed,
}

/// A successful registration.
///
/// `queue` is the receiving end of the client's bounded outbound queue;
/// `token` identifies this particular registration so a superseded
/// connection's teardown cannot remove its replacement.
pub struct Registration {
    pub token: u64,
    pub queue: mpsc::Receiver<Notification>,
}

enum Command {
    Register {
        user_id: u64,
        reply: oneshot::Sender<Registration>,
    },
    Unregister {
        user_id: u64,
    },
    Release {
        user_id: u64,
        token: u64,
    },
    Broadcast(Notification),
    Count(oneshot::Sender<usize>),
}

struct ClientEntry {
    token: u64,
    queue: mpsc::Sender<Notification>,
}

/// Handle to the hub control loop.
///
/// Cheap to clone; the loop exits once every handle has been dropped and
/// all in-flight commands are drained.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<Command>,
}

impl Hub {
    /// Spawn the control loop and return a handle to it.
    pub fn spawn(config: HubConfig) -> Self {
        let (commands, rx) = mpsc::channel(config.command_queue_capacity);
        tokio::spawn(control_loop(config, rx));
        Self { commands }
    }

    /// Register a client connection.
    ///
    /// Registering a user that is already present replaces the prior entry;
    /// the superseded queue is closed, which terminates the old connection's
    /// delivery loop and closes its socket.
    pub async fn register(&self, user_id: u64) -> Result<Registration, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Register { user_id, reply })
            .await
            .map_err(|_| HubError::Closed)?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Remove a client if registered. Unknown users are a no-op.
    pub async fn unregister(&self, user_id: u64) -> Result<(), HubError> {
        self.commands
            .send(Command::Unregister { user_id })
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Remove a client only if `token` still identifies its registration.
    ///
    /// Used by connection teardown: a connection that was already evicted or
    /// superseded must not unregister the live entry for the same user.
    pub async fn release(&self, user_id: u64, token: u64) -> Result<(), HubError> {
        self.commands
            .send(Command::Release { user_id, token })
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Enqueue a notification onto every registered client's outbound queue.
    ///
    /// "Delivered" means enqueued: broadcast never waits for the client side.
    /// A client whose queue is full or closed is evicted immediately rather
    /// than allowed to stall delivery to others.
    pub async fn broadcast(&self, notification: Notification) -> Result<(), HubError> {
        self.commands
            .send(Command::Broadcast(notification))
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Number of currently registered clients.
    pub async fn client_count(&self) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Count(reply))
            .await
            .map_err(|_| HubError::Closed)?;
        rx.await.map_err(|_| HubError::Closed)
    }
}

/// Single owner of the registry: every mutation flows through here.
async fn control_loop(config: HubConfig, mut commands: mpsc::Receiver<Command>) {
    let mut registry: HashMap<u64, ClientEntry> = HashMap::new();
    let mut next_token: u64 = 0;

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register { user_id, reply } => {
                let (queue_tx, queue_rx) = mpsc::channel(config.client_queue_capacity);
                next_token += 1;
                let token = next_token;

                let previous = registry.insert(
                    user_id,
                    ClientEntry {
                        token,
                        queue: queue_tx,
                    },
                );
                if previous.is_some() {
                    // The old sender drops here; the superseded delivery
                    // loop sees its queue close and shuts the stale socket.
                    debug!(user_id, "replaced existing registration");
                }

                let registration = Registration {
                    token,
                    queue: queue_rx,
                };
                if reply.send(registration).is_err() {
                    // Caller vanished between request and reply.
                    registry.remove(&user_id);
                    continue;
                }
                info!(user_id, clients = registry.len(), "client registered");
            }
            Command::Unregister { user_id } => {
                if registry.remove(&user_id).is_some() {
                    info!(user_id, clients = registry.len(), "client unregistered");
                }
            }
            Command::Release { user_id, token } => {
                let matches = registry.get(&user_id).is_some_and(|e| e.token == token);
                if matches {
                    registry.remove(&user_id);
                    info!(user_id, clients = registry.len(), "client released");
                }
            }
            Command::Broadcast(notification) => {
                let mut evicted = Vec::new();
                for (user_id, entry) in &registry {
                    match entry.queue.try_send(notification.clone()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!(user_id, "client queue full, evicting slow consumer");
                            evicted.push(*user_id);
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            debug!(user_id, "client queue closed, evicting");
                            evicted.push(*user_id);
                        }
                    }
                }
                for user_id in evicted {
                    registry.remove(&user_id);
                }
            }
            Command::Count(reply) => {
                let _ = reply.send(registry.len());
            }
        }
    }

    debug!(clients = registry.len(), "hub control loop exiting");
}
