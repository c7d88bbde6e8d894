//! One claim session for one event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::blockchain::ChainReader;
use crate::claims::{
    AddressResolver, ClaimSubmitter, Event, ResolutionError, ResolvedAddress, SubmissionError,
    Transaction, TransactionStatus, TxIdentity,
};
use crate::config::ReconcilerConfig;
use crate::lifecycle::Teardown;
use crate::queue::DeliveryQueueClient;
use crate::reconcile::{Notifier, Reconciler};
use crate::store::TransactionStore;

/// Errors surfaced by [`ClaimView`] actions.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("This event is not accepting claims")]
    EventInactive,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("No validated address to claim for")]
    NotValidated,

    #[error("A claim is already in progress")]
    AlreadyClaiming,

    #[error("This address has already claimed")]
    AlreadyClaimed,

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Reconciliation already started for this view")]
    AlreadyStarted,
}

/// Which screen the flow is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AddressEntry,
    Confirmation,
}

/// Everything the user has typed or been told.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormState {
    pub input: String,
    pub validated: Option<ResolvedAddress>,
    /// Inline error from the last validation.
    pub error: Option<String>,
    pub claiming: bool,
    /// Queue entry of this view's last completed submission. Cleared while a
    /// submission is awaiting the backend.
    pub last_queue_uid: Option<String>,
}

/// Collaborators a view is wired to.
#[derive(Clone)]
pub struct ViewDeps {
    pub chain: Arc<dyn ChainReader>,
    pub queue: Arc<dyn DeliveryQueueClient>,
    pub store: TransactionStore,
    pub notifier: Notifier,
    pub reconciler: ReconcilerConfig,
}

struct ViewInner {
    id: Uuid,
    event: ArcSwap<Event>,
    delivery_id: u64,
    deps: ViewDeps,
    resolver: AddressResolver,
    submitter: ClaimSubmitter,
    form: Mutex<FormState>,
    claimed: AtomicBool,
    started: AtomicBool,
    teardown: Teardown,
}

/// The claim flow for one event: validate an address, submit the claim,
/// and keep its transactions reconciled until torn down.
///
/// Cheap to clone; clones share the same session. Dropping the last clone
/// tears the session down.
#[derive(Clone)]
pub struct ClaimView {
    inner: Arc<ViewInner>,
}

impl ClaimView {
    pub fn new(event: Event, delivery_id: u64, deps: ViewDeps) -> Self {
        let resolver = AddressResolver::new(deps.chain.clone());
        let submitter = ClaimSubmitter::new(deps.queue.clone());
        Self {
            inner: Arc::new(ViewInner {
                id: Uuid::new_v4(),
                event: ArcSwap::from_pointee(event),
                delivery_id,
                deps,
                resolver,
                submitter,
                form: Mutex::new(FormState::default()),
                claimed: AtomicBool::new(false),
                started: AtomicBool::new(false),
                teardown: Teardown::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.deps.notifier
    }

    pub fn event(&self) -> Arc<Event> {
        self.inner.event.load_full()
    }

    /// Swap in a fresh copy of the event, e.g. with updated `claims`.
    pub fn replace_event(&self, event: Event) {
        self.inner.event.store(Arc::new(event));
        self.refresh();
    }

    pub fn form(&self) -> FormState {
        self.lock_form().clone()
    }

    pub fn phase(&self) -> Phase {
        if self.lock_form().validated.is_some() {
            Phase::Confirmation
        } else {
            Phase::AddressEntry
        }
    }

    /// Whether the validated address already holds this event's reward.
    pub fn is_claimed(&self) -> bool {
        self.inner.claimed.load(Ordering::Acquire)
    }

    pub fn set_input(&self, input: impl Into<String>) {
        let mut form = self.lock_form();
        form.input = input.into();
        form.error = None;
    }

    /// Resolve the current input and move to confirmation on success.
    pub async fn validate(&self) -> Result<ResolvedAddress, ViewError> {
        let event = self.inner.event.load_full();
        if !event.active {
            return Err(ViewError::EventInactive);
        }

        let input = self.lock_form().input.clone();
        match self.inner.resolver.resolve(&input, &event).await {
            Ok(resolved) => {
                {
                    let mut form = self.lock_form();
                    form.validated = Some(resolved.clone());
                    form.error = None;
                }
                self.refresh();
                Ok(resolved)
            }
            Err(e) => {
                let mut form = self.lock_form();
                form.validated = None;
                form.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Back to address entry.
    pub fn clear_form(&self) {
        *self.lock_form() = FormState::default();
        self.inner.claimed.store(false, Ordering::Release);
    }

    /// Submit the validated address and start tracking the claim.
    ///
    /// Refused while another submission of this view is unresolved, and for
    /// an address the event already records as claimed or whose tracked
    /// claim was delivered.
    pub async fn submit(&self) -> Result<Transaction, ViewError> {
        let event = self.inner.event.load_full();
        let address = {
            let mut form = self.lock_form();
            let address = form
                .validated
                .as_ref()
                .map(|v| v.address)
                .ok_or(ViewError::NotValidated)?;
            if form.claiming {
                return Err(ViewError::AlreadyClaiming);
            }
            let delivered =
                self.tracked_status(&event, address) == Some(TransactionStatus::Passed);
            if event.is_claimed(&address) || delivered {
                return Err(ViewError::AlreadyClaimed);
            }
            form.claiming = true;
            form.last_queue_uid = None;
            address
        };

        let event_key = event.key.clone();
        match self
            .inner
            .submitter
            .submit(&event_key, self.inner.delivery_id, address)
            .await
        {
            Ok(tx) => {
                self.lock_form().last_queue_uid = Some(tx.queue_uid.clone());
                let outcome = self.inner.deps.store.save(tx.clone());
                tracing::debug!(view = %self.inner.id, ?outcome, "Stored submitted claim");
                Ok(tx)
            }
            Err(e) => {
                self.lock_form().claiming = false;
                Err(e.into())
            }
        }
    }

    /// Spawn the reconciler for this view's event.
    pub fn start(&self) -> Result<JoinHandle<()>, ViewError> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(ViewError::AlreadyStarted);
        }

        let deps = &self.inner.deps;
        let reconciler = Reconciler::new(
            self.inner.event.load().key.clone(),
            deps.store.clone(),
            deps.queue.clone(),
            deps.chain.clone(),
            deps.notifier.clone(),
            &deps.reconciler,
        );
        let signal = self.inner.teardown.signal();
        let view = Arc::downgrade(&self.inner);

        tracing::info!(view = %self.inner.id, event_key = %reconciler.event_key(), "Claim view started");
        Ok(tokio::spawn(async move {
            reconciler
                .run(signal, move |_| {
                    if let Some(inner) = view.upgrade() {
                        ClaimView { inner }.refresh();
                    }
                })
                .await;
        }))
    }

    /// Stop reconciliation. Results of a tick still in flight are discarded.
    pub fn teardown(&self) {
        self.inner.teardown.trigger();
        tracing::info!(view = %self.inner.id, "Claim view torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.teardown.is_triggered()
    }

    /// This event's transactions in insertion order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner
            .deps
            .store
            .list_for_event(&self.inner.event.load().key)
    }

    /// Recompute the claimed indicator and release the claim guard once this
    /// view's own submission has failed.
    ///
    /// The indicator comes from `Event.claims` only; tracked transactions are
    /// a separate signal.
    pub fn refresh(&self) {
        let Some(address) = self.validated_address() else {
            return;
        };
        let event = self.inner.event.load();
        self.inner
            .claimed
            .store(event.is_claimed(&address), Ordering::Release);

        let tracked = self.inner.deps.store.get(&TxIdentity {
            key: event.key.clone(),
            address,
        });
        let Some(tx) = tracked.filter(|tx| tx.status == TransactionStatus::Failed) else {
            return;
        };

        let mut form = self.lock_form();
        if form.claiming && form.last_queue_uid.as_deref() == Some(tx.queue_uid.as_str()) {
            form.claiming = false;
            tracing::debug!(
                view = %self.inner.id,
                address = %address,
                queue_uid = %tx.queue_uid,
                "Claim failed, re-submission allowed"
            );
        }
    }

    fn tracked_status(&self, event: &Event, address: Address) -> Option<TransactionStatus> {
        self.inner
            .deps
            .store
            .get(&TxIdentity {
                key: event.key.clone(),
                address,
            })
            .map(|tx| tx.status)
    }

    fn validated_address(&self) -> Option<Address> {
        self.lock_form().validated.as_ref().map(|v| v.address)
    }

    fn lock_form(&self) -> MutexGuard<'_, FormState> {
        self.inner
            .form
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
