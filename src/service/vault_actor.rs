use crate::error::DeskError;
use crate::heap::{self, HeapDiff, HeapSnapshot};
use crate::service::cipher::ContentCipher;
use crate::service::memory_store::{EntrySize, MemoryStore};
use crate::service::usage::{self, ProcessUsage};

use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TOP_ENTRIES: usize = 10;

/// A session vault untouched this long is dropped, along with its key.
pub const IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Last vault operation, shown as the label of the usage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Startup,
    Upload,
    Read,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub step: Step,
    pub captured_at: DateTime<Utc>,
    pub process: Option<ProcessUsage>,
    pub rss_mib: Option<f64>,
    pub heap: HeapSnapshot,
    pub heap_diff: HeapDiff,
    pub records: usize,
    pub records_diff: i64,
    pub top_entries: Vec<EntrySize>,
}

/// Opaque name of one browser session's vault.
pub type VaultId = String;

/// Public messages handled by the vault actor. Every message names the
/// session vault it applies to.
#[derive(Debug)]
pub enum VaultMessage {
    Upload(VaultId, String, String, bool, RpcReplyPort<Result<(), DeskError>>),
    Read(VaultId, String, RpcReplyPort<Result<String, DeskError>>),
    Update(VaultId, String, String, bool, RpcReplyPort<Result<(), DeskError>>),
    Delete(VaultId, String, RpcReplyPort<Result<(), DeskError>>),
    /// Take a new snapshot, diff it against the session's previous one and keep it.
    Report(VaultId, RpcReplyPort<UsageReport>),
}

/// Handle for interacting with the vault actor.
#[derive(Debug, Clone)]
pub struct VaultHandle {
    actor: ActorRef<VaultMessage>,
}

impl VaultHandle {
    /// The vault belonging to one session. It is created on first use.
    pub fn session(&self, id: impl Into<VaultId>) -> SessionVault {
        SessionVault {
            actor: self.actor.clone(),
            id: id.into(),
        }
    }
}

/// One session's store, behind the shared actor.
#[derive(Debug, Clone)]
pub struct SessionVault {
    actor: ActorRef<VaultMessage>,
    id: VaultId,
}

impl SessionVault {
    pub async fn upload(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        confidential: bool,
    ) -> Result<(), DeskError> {
        ractor::call!(
            self.actor,
            VaultMessage::Upload,
            self.id.clone(),
            key.into(),
            value.into(),
            confidential
        )
        .map_err(|e| DeskError::RactorError(format!("Upload RPC failed: {e}")))?
    }

    pub async fn read(&self, key: impl Into<String>) -> Result<String, DeskError> {
        ractor::call!(self.actor, VaultMessage::Read, self.id.clone(), key.into())
            .map_err(|e| DeskError::RactorError(format!("Read RPC failed: {e}")))?
    }

    pub async fn update(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        confidential: bool,
    ) -> Result<(), DeskError> {
        ractor::call!(
            self.actor,
            VaultMessage::Update,
            self.id.clone(),
            key.into(),
            value.into(),
            confidential
        )
        .map_err(|e| DeskError::RactorError(format!("Update RPC failed: {e}")))?
    }

    pub async fn delete(&self, key: impl Into<String>) -> Result<(), DeskError> {
        ractor::call!(self.actor, VaultMessage::Delete, self.id.clone(), key.into())
            .map_err(|e| DeskError::RactorError(format!("Delete RPC failed: {e}")))?
    }

    pub async fn report_usage(&self) -> Result<UsageReport, DeskError> {
        ractor::call!(self.actor, VaultMessage::Report, self.id.clone())
            .map_err(|e| DeskError::RactorError(format!("Report RPC failed: {e}")))
    }
}

/// Store and report baseline of one session. Each slot has its own key.
struct VaultSlot {
    store: MemoryStore,
    step: Step,
    last_heap: HeapSnapshot,
    last_records: usize,
    last_seen: Instant,
}

impl VaultSlot {
    fn new(now: Instant) -> Self {
        Self {
            store: MemoryStore::new(ContentCipher::generate()),
            step: Step::Startup,
            last_heap: heap::snapshot(),
            last_records: 0,
            last_seen: now,
        }
    }
}

/// Internal state held by the vault actor
struct VaultActorState {
    slots: HashMap<VaultId, VaultSlot>,
}

impl VaultActorState {
    /// The slot for `id`, created when absent. Idle slots are dropped first.
    fn slot(&mut self, id: VaultId, now: Instant) -> &mut VaultSlot {
        if !self.slots.contains_key(&id) {
            self.evict_idle(now);
            debug!(sessions = self.slots.len() + 1, "opening session vault");
        }
        let slot = self.slots.entry(id).or_insert_with(|| VaultSlot::new(now));
        slot.last_seen = now;
        slot
    }

    fn evict_idle(&mut self, now: Instant) {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| now.saturating_duration_since(slot.last_seen) < IDLE_TTL);
        let evicted = before - self.slots.len();
        if evicted > 0 {
            info!(evicted, "dropped idle session vaults");
        }
    }
}

struct VaultActor;

#[ractor::async_trait]
impl Actor for VaultActor {
    type Msg = VaultMessage;
    type State = VaultActorState;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("VaultActor started; session vaults open on first use");
        Ok(VaultActorState {
            slots: HashMap::new(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let now = Instant::now();
        match message {
            VaultMessage::Upload(id, key, value, confidential, rp) => {
                let slot = state.slot(id, now);
                let res = slot.store.upload(&key, &value, confidential);
                finish(slot, Step::Upload, &key, &res);
                let _ = rp.send(res);
            }
            VaultMessage::Read(id, key, rp) => {
                let slot = state.slot(id, now);
                let res = slot.store.read(&key);
                // Reads move the label even when the key is absent.
                slot.step = Step::Read;
                debug!(key = %key, found = res.is_ok(), "vault read");
                let _ = rp.send(res);
            }
            VaultMessage::Update(id, key, value, confidential, rp) => {
                let slot = state.slot(id, now);
                let res = slot.store.update(&key, &value, confidential);
                finish(slot, Step::Update, &key, &res);
                let _ = rp.send(res);
            }
            VaultMessage::Delete(id, key, rp) => {
                let slot = state.slot(id, now);
                let res = slot.store.delete(&key);
                finish(slot, Step::Delete, &key, &res);
                let _ = rp.send(res);
            }
            VaultMessage::Report(id, rp) => {
                let _ = rp.send(report(state.slot(id, now)));
            }
        }
        Ok(())
    }
}

fn finish(slot: &mut VaultSlot, step: Step, key: &str, res: &Result<(), DeskError>) {
    match res {
        Ok(()) => {
            slot.step = step;
            debug!(key = %key, ?step, records = slot.store.len(), "vault write applied");
        }
        Err(e) => debug!(key = %key, ?step, error = %e, "vault write rejected"),
    }
}

fn report(slot: &mut VaultSlot) -> UsageReport {
    let process = usage::current()
        .inspect_err(|e| warn!(error = %e, "failed to read process usage"))
        .ok();

    let heap = heap::snapshot();
    let heap_diff = heap.compare_to(&slot.last_heap);
    slot.last_heap = heap;

    let records = slot.store.len();
    let records_diff = records as i64 - slot.last_records as i64;
    slot.last_records = records;

    UsageReport {
        step: slot.step,
        captured_at: Utc::now(),
        rss_mib: process.and_then(|p| p.rss_mib()),
        process,
        heap,
        heap_diff,
        records,
        records_diff,
        top_entries: slot.store.largest(TOP_ENTRIES),
    }
}

/// Spawn the vault actor and return a handle.
pub async fn spawn() -> Result<VaultHandle, DeskError> {
    let (actor, _jh) = Actor::spawn(None, VaultActor, ())
        .await
        .map_err(|e| DeskError::RactorError(format!("failed to spawn VaultActor: {e}")))?;
    Ok(VaultHandle { actor })
}
