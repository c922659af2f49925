//! Signaling relay — peer sign-in/out and message hand-off between peers.
//!
//! Each signed-in peer owns a mailbox. A message for a peer that is parked
//! on `wait` is handed over immediately; otherwise it is buffered until the
//! next `wait`, up to the configured mailbox limit.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use peerview_core::config::SignalingConfig;
use peerview_core::peer::{PeerId, PeerRecord};

use crate::directory::PeerDirectory;

/// A relayed signaling payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: PeerId,
    pub body: Bytes,
}

/// How `send` got the message to its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The recipient was waiting and has been woken.
    Direct,
    /// The recipient was not waiting; the message sits in its mailbox.
    Buffered,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("peer {0} not found")]
    UnknownPeer(PeerId),
    #[error("mailbox for peer {0} is full")]
    MailboxFull(PeerId),
    #[error("no message arrived for peer {0}")]
    TimedOut(PeerId),
    #[error("peer {0} signed out while waiting")]
    SignedOut(PeerId),
}

#[derive(Default)]
struct Mailbox {
    queue: Mutex<VecDeque<Envelope>>,
    notify: Notify,
    waiters: AtomicUsize,
    closed: AtomicBool,
}

/// Marks a peer live for as long as at least one wait is parked.
struct LiveGuard<'a> {
    directory: &'a PeerDirectory,
    mailbox: &'a Mailbox,
    id: PeerId,
}

impl<'a> LiveGuard<'a> {
    fn enter(directory: &'a PeerDirectory, mailbox: &'a Mailbox, id: PeerId) -> Self {
        // The queue lock orders the count change with its status write.
        let _queue = mailbox.queue.lock();
        if mailbox.waiters.fetch_add(1, Ordering::SeqCst) == 0 {
            directory.set_status(id, true);
        }
        Self {
            directory,
            mailbox,
            id,
        }
    }
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        let _queue = self.mailbox.queue.lock();
        if self.mailbox.waiters.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.directory.set_status(self.id, false);
        }
    }
}

#[derive(Clone)]
pub struct SignalRelay {
    directory: PeerDirectory,
    mailboxes: Arc<DashMap<PeerId, Arc<Mailbox>>>,
    mailbox_limit: usize,
    wait_timeout: Duration,
}

impl SignalRelay {
    pub fn new(directory: PeerDirectory, settings: &SignalingConfig) -> Self {
        Self {
            directory,
            mailboxes: Arc::new(DashMap::new()),
            mailbox_limit: settings.mailbox_limit,
            wait_timeout: Duration::from_secs(settings.wait_timeout_secs),
        }
    }

    /// Override the wait timeout. Mostly useful in tests.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Register a peer and open its mailbox.
    pub fn sign_in(&self, name: &str, capacity: u32) -> PeerId {
        let id = self.directory.add_peer_with_capacity(name, capacity);
        self.mailboxes.insert(id, Arc::new(Mailbox::default()));
        tracing::info!(peer_id = id, name, capacity, "peer signed in");
        id
    }

    /// Remove a peer, dropping its buffered messages and waking its waits.
    pub fn sign_out(&self, id: PeerId) -> Option<PeerRecord> {
        if let Some((_, mailbox)) = self.mailboxes.remove(&id) {
            mailbox.closed.store(true, Ordering::SeqCst);
            mailbox.notify.notify_waiters();
            let dropped = mailbox.queue.lock().len();
            if dropped > 0 {
                tracing::warn!(peer_id = id, dropped, "discarding undelivered messages");
            }
        }
        let removed = self.directory.remove_peer(id);
        if removed.is_some() {
            tracing::info!(peer_id = id, "peer signed out");
            if self.directory.is_empty() {
                tracing::debug!("last peer signed out, directory is empty");
            }
        }
        removed
    }

    /// Hand `body` from `from` to `to`.
    pub fn send(&self, from: PeerId, to: PeerId, body: Bytes) -> Result<Delivery, RelayError> {
        if !self.directory.contains(from) {
            return Err(RelayError::UnknownPeer(from));
        }
        let mailbox = self.mailbox(to)?;

        let delivery = {
            let mut queue = mailbox.queue.lock();
            if queue.len() >= self.mailbox_limit {
                tracing::warn!(from, to, limit = self.mailbox_limit, "mailbox full, dropping message");
                return Err(RelayError::MailboxFull(to));
            }
            queue.push_back(Envelope { from, body });
            if mailbox.waiters.load(Ordering::SeqCst) > 0 {
                Delivery::Direct
            } else {
                Delivery::Buffered
            }
        };
        mailbox.notify.notify_one();
        tracing::debug!(from, to, ?delivery, "message relayed");
        Ok(delivery)
    }

    /// Next message for `id`, parking up to the wait timeout if none is buffered.
    pub async fn wait(&self, id: PeerId) -> Result<Envelope, RelayError> {
        let mailbox = self.mailbox(id)?;
        let buffered = mailbox.queue.lock().pop_front();
        if let Some(envelope) = buffered {
            return Ok(envelope);
        }

        let _live = LiveGuard::enter(&self.directory, &mailbox, id);
        let deadline = tokio::time::Instant::now() + self.wait_timeout;
        loop {
            let notified = mailbox.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if mailbox.closed.load(Ordering::SeqCst) {
                return Err(RelayError::SignedOut(id));
            }
            let next = mailbox.queue.lock().pop_front();
            if let Some(envelope) = next {
                return Ok(envelope);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(RelayError::TimedOut(id));
            }
        }
    }

    /// Messages buffered across all mailboxes.
    pub fn buffered(&self) -> usize {
        self.mailboxes.iter().map(|m| m.queue.lock().len()).sum()
    }

    fn mailbox(&self, id: PeerId) -> Result<Arc<Mailbox>, RelayError> {
        self.mailboxes
            .get(&id)
            .map(|m| Arc::clone(m.value()))
            .ok_or(RelayError::UnknownPeer(id))
    }
}
