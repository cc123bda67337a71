//! Dispatch loop — polls the contact store and delivers the payload to every
//! pending contact, one at a time.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Polling ──error──▶ Backoff ──(backoff)──▶ Polling
//!    │ ────empty──▶ Idle ────(idle)─────▶ Polling
//!    └──contacts──▶ Dispatching ─(batch)─▶ Polling
//! ```
//!
//! Contacts in a batch are processed strictly sequentially with a jittered
//! pause after each one; the channel flags accounts that send in bursts.
//! Every contact ends with exactly one outcome write. A crash between a send
//! and its outcome write means the contact is sent again on the next run.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

use courier_common::types::{Contact, Outcome};

use crate::delivery::DeliveryClient;
use crate::normalizer;
use crate::pacing::Pacing;
use crate::payload::MediaPayload;
use crate::store::ContactStore;

/// Current position of the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    /// About to query the store.
    Polling,
    /// Last poll found nothing; waiting before the next one.
    Idle,
    /// Last poll (or payload load) failed; waiting before retrying.
    Backoff,
    /// A batch of pending contacts and the payload to send them.
    Dispatching {
        contacts: Vec<Contact>,
        payload: MediaPayload,
    },
}

/// Counts for one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub sent: u32,
    pub failed: u32,
    /// Contacts whose outcome write failed; they remain pending.
    pub unrecorded: u32,
}

/// Where the static media and caption are read from.
#[derive(Debug, Clone)]
pub struct PayloadPaths {
    pub media: PathBuf,
    pub caption: PathBuf,
}

/// Sequential dispatcher driving [`DispatchState`].
pub struct Dispatcher {
    store: Arc<dyn ContactStore>,
    delivery: Arc<dyn DeliveryClient>,
    pacing: Pacing,
    paths: PayloadPaths,
    state: DispatchState,
    shutdown: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ContactStore>,
        delivery: Arc<dyn DeliveryClient>,
        pacing: Pacing,
        paths: PayloadPaths,
    ) -> Self {
        Self {
            store,
            delivery,
            pacing,
            paths,
            state: DispatchState::Polling,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the loop at the next state boundary or between two
    /// contacts of a batch.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Run until the shutdown flag is set.
    pub async fn run(&mut self) {
        tracing::info!(
            media = %self.paths.media.display(),
            caption = %self.paths.caption.display(),
            "Dispatch loop started"
        );

        while !self.shutdown.load(Ordering::Relaxed) {
            self.step().await;
        }

        tracing::info!("Dispatch loop stopped");
    }

    /// Execute the current state and move to the next one.
    ///
    /// Returns the batch summary when a `Dispatching` state was executed.
    pub async fn step(&mut self) -> Option<BatchSummary> {
        let state = std::mem::replace(&mut self.state, DispatchState::Polling);

        match state {
            DispatchState::Polling => {
                self.state = self.poll().await;
                None
            }
            DispatchState::Idle => {
                tracing::debug!(wait_secs = self.pacing.idle().as_secs(), "No pending contacts");
                tokio::time::sleep(self.pacing.idle()).await;
                None
            }
            DispatchState::Backoff => {
                tokio::time::sleep(self.pacing.backoff()).await;
                None
            }
            DispatchState::Dispatching { contacts, payload } => {
                let summary = self.dispatch_batch(&contacts, &payload).await;
                tracing::info!(
                    sent = summary.sent,
                    failed = summary.failed,
                    unrecorded = summary.unrecorded,
                    "Batch complete"
                );
                Some(summary)
            }
        }
    }

    /// Query the store and decide the next state.
    async fn poll(&self) -> DispatchState {
        let contacts = match self.store.fetch_pending().await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    retry_secs = self.pacing.backoff().as_secs(),
                    "Failed to fetch pending contacts"
                );
                return DispatchState::Backoff;
            }
        };

        if contacts.is_empty() {
            return DispatchState::Idle;
        }

        let payload = match MediaPayload::load(&self.paths.media, &self.paths.caption).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load dispatch payload");
                return DispatchState::Backoff;
            }
        };

        tracing::info!(count = contacts.len(), "Pending contacts fetched");
        DispatchState::Dispatching { contacts, payload }
    }

    async fn dispatch_batch(&mut self, contacts: &[Contact], payload: &MediaPayload) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for contact in contacts {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("Shutdown requested, leaving rest of batch pending");
                break;
            }

            let outcome = self.process_contact(contact, payload).await;

            match self
                .store
                .mark_outcome(contact.id, Utc::now(), outcome.message())
                .await
            {
                Ok(()) => match &outcome {
                    Outcome::Sent { identifier, .. } => {
                        tracing::info!(contact_id = %contact.id, %identifier, "Recorded delivery");
                        summary.sent += 1;
                    }
                    Outcome::Failed => {
                        tracing::info!(contact_id = %contact.id, "Recorded failure");
                        summary.failed += 1;
                    }
                },
                Err(e) => {
                    tracing::error!(
                        contact_id = %contact.id,
                        outcome = %outcome,
                        error = %e,
                        "Failed to record outcome"
                    );
                    summary.unrecorded += 1;
                }
            }

            let delay = self.pacing.next_delay();
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Pausing before next contact");
            tokio::time::sleep(delay).await;
        }

        summary
    }

    /// Try each candidate identifier until one validates and accepts the send.
    pub async fn process_contact(&self, contact: &Contact, payload: &MediaPayload) -> Outcome {
        let candidates = normalizer::candidates(&contact.phone);
        if candidates.is_empty() {
            tracing::warn!(contact_id = %contact.id, "Phone number too short, skipping delivery");
            return Outcome::Failed;
        }

        for identifier in candidates {
            match self.delivery.validate(&identifier).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(contact_id = %contact.id, %identifier, "Not registered");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        contact_id = %contact.id,
                        %identifier,
                        error = %e,
                        "Validation failed"
                    );
                    continue;
                }
            }

            match self
                .delivery
                .send(&identifier, &payload.media, &payload.caption)
                .await
            {
                Ok(()) => {
                    tracing::info!(contact_id = %contact.id, %identifier, "Message sent");
                    return Outcome::Sent {
                        identifier,
                        caption: payload.caption.clone(),
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        contact_id = %contact.id,
                        %identifier,
                        error = %e,
                        "Send failed"
                    );
                }
            }
        }

        tracing::warn!(contact_id = %contact.id, "No candidate identifier accepted the message");
        Outcome::Failed
    }
}
