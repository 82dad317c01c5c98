// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The orchestrator: wires C1-C8 together and dispatches on the §6 `Event` taxonomy. The direct
//! generalization of the teacher's `idata_handler::IDataHandler` (whose `handle_put_idata_req` /
//! `handle_get_idata_req` / `handle_mutation_resp` are the shape every `handle_*` method below
//! follows), enriched with the Sync Resolver, Get Operation and Churn Handler the teacher's
//! phase-1 implementation didn't yet have.

use crate::config::Config;
use crate::data_manager::action_log::{ActionKind, ActionPayload, PostHook};
use crate::data_manager::churn::ChurnHandler;
use crate::data_manager::dispatcher::{DeadlineTimerRegistry, Dispatcher};
use crate::data_manager::entry::{MetadataEntry, StorageCost, TypeTag};
use crate::data_manager::get_op::{random_nonce, GetOperation};
use crate::data_manager::placement::PlacementEngine;
use crate::data_manager::store::MetadataStore;
use crate::data_manager::sync_resolver::{ProposalOutcome, SyncResolver};
use crate::data_manager::validate::{validate_sender, SenderRole};
use crate::error::{Error, Result};
use crate::routing::{HolderId, RoutingOracle};
use crate::rpc::{DataKey, Event, IntegrityCheck, MessageId};
use crate::vault::Init;
use log::{trace, warn};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A Put still awaiting its first (or a replacement) holder acknowledgement. Kept in memory only
/// for the lifetime of the in-flight Put, mirroring the teacher's `idata_ops` cache of the
/// request payload for the duration of an `IDataOp` (`idata_handler.rs`).
struct PendingPut {
    requester: HolderId,
    data: Vec<u8>,
    tried: BTreeSet<HolderId>,
}

/// One `SyncResolver` per action kind (spec §5: "resolvers of different kinds never interlock").
struct Resolvers {
    put: SyncResolver,
    delete: SyncResolver,
    add_holder: SyncResolver,
    remove_holder: SyncResolver,
    node_down: SyncResolver,
    node_up: SyncResolver,
}

impl Resolvers {
    fn new(quorum: usize, retransmit_cap: u32, max_unresolved: usize) -> Self {
        let make = |kind| SyncResolver::new(kind, quorum, retransmit_cap, max_unresolved);
        Self {
            put: make(ActionKind::Put),
            delete: make(ActionKind::Delete),
            add_holder: make(ActionKind::AddHolder),
            remove_holder: make(ActionKind::RemoveHolder),
            node_down: make(ActionKind::NodeDown),
            node_up: make(ActionKind::NodeUp),
        }
    }

    fn for_kind(&self, kind: ActionKind) -> &SyncResolver {
        match kind {
            ActionKind::Put => &self.put,
            ActionKind::Delete => &self.delete,
            ActionKind::AddHolder => &self.add_holder,
            ActionKind::RemoveHolder => &self.remove_holder,
            ActionKind::NodeDown => &self.node_down,
            ActionKind::NodeUp => &self.node_up,
        }
    }

    fn all(&self) -> [&SyncResolver; 6] {
        [
            &self.put,
            &self.delete,
            &self.add_holder,
            &self.remove_holder,
            &self.node_down,
            &self.node_up,
        ]
    }
}

/// Outcome of submitting a local or peer-sourced proposal, surfaced so callers can run the
/// follow-on side effects (holder deletes, further dispatch) that accompany a resolution.
enum Submitted {
    Pending,
    Resolved {
        new_entry: Option<MetadataEntry>,
        holders_before: BTreeSet<HolderId>,
        post_hook: Option<PostHook>,
    },
}

/// The Data Manager persona: one instance per vault process, holding the §3-§5 state (Metadata
/// Store, Sync Resolvers, in-flight Get Operations, holder reputation) behind a narrow
/// `handle_event` entry point.
pub struct Service {
    my_id: HolderId,
    config: Config,
    routing: Arc<dyn RoutingOracle>,
    store: MetadataStore,
    resolvers: Resolvers,
    get_ops: Mutex<HashMap<MessageId, Arc<GetOperation>>>,
    pending_puts: Mutex<HashMap<MessageId, PendingPut>>,
    timers: DeadlineTimerRegistry,
    dispatcher: Dispatcher,
    rng: Mutex<ChaChaRng>,
    /// Holders de-ranked after a detected integrity failure (§9 open question (a); supplemented
    /// from `original_source/data_manager/service.h`'s `DerankPmidNode`/`DeletePmidNodeAsHolder`).
    /// A de-ranked holder is excluded from read-source selection; de-ranking and removal both
    /// fire together on the first detected violation (spec §4.6, §7 — never escalated).
    reputation: Mutex<HashSet<HolderId>>,
}

impl Service {
    pub fn new<D: AsRef<Path>>(
        root_dir: D,
        init_mode: Init,
        config: Config,
        routing: Arc<dyn RoutingOracle>,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        let quorum = config.quorum();
        let retransmit_cap = config.retransmit_cap;
        let max_unresolved = config.max_unresolved_actions_per_kind;
        let max_concurrent_gets = config.max_concurrent_gets;
        Ok(Self {
            my_id: routing.my_id(),
            config,
            store: MetadataStore::new(root_dir, init_mode)?,
            resolvers: Resolvers::new(quorum, retransmit_cap, max_unresolved),
            get_ops: Mutex::new(HashMap::new()),
            pending_puts: Mutex::new(HashMap::new()),
            timers: DeadlineTimerRegistry::new(max_concurrent_gets),
            dispatcher,
            rng: Mutex::new(ChaChaRng::from_rng(rand::thread_rng()).expect("thread_rng never fails")),
            reputation: Mutex::new(HashSet::new()),
            routing,
        })
    }

    /// Sender-role gate for demultiplexer callers that have a claimed role available from the
    /// message envelope (spec §9 open question (c)). Permissive unless
    /// `Config::enforce_sender_role` is set.
    pub fn accept_sender(&self, event: &Event, claimed_role: SenderRole) -> bool {
        !self.config.enforce_sender_role || validate_sender(event, claimed_role)
    }

    /// The single inbound entry point: every event from §6's taxonomy lands here.
    pub fn handle_event(&self, event: Event) {
        match event {
            Event::PutRequestFromOrigin {
                requester,
                key,
                data,
                message_id,
            } => self.handle_put(requester, key, data, message_id),
            Event::PutResponseFromStorageGroup {
                holder,
                key,
                message_id,
                size,
            } => self.handle_put_response(holder, key, message_id, size),
            Event::PutFailureFromStorageGroup {
                holder,
                key,
                message_id,
                error,
            } => self.handle_put_failure(holder, key, message_id, error),
            Event::GetRequestFromClient {
                requester,
                key,
                message_id,
            }
            | Event::GetRequestFromAuxiliary {
                requester,
                key,
                message_id,
            } => self.handle_get(requester, key, message_id),
            Event::GetResponseFromHolder {
                holder,
                message_id,
                content,
            } => self.handle_get_response(holder, message_id, content),
            Event::GetCachedResponseFromCache { message_id, content } => {
                self.handle_get_response(self.my_id, message_id, content)
            }
            Event::DeleteRequestFromOrigin {
                requester: _,
                key,
                message_id,
            } => self.handle_delete(key, message_id),
            Event::SynchroniseFromPeer {
                proposer,
                key,
                kind,
                payload,
            } => self.handle_sync(proposer, key, kind, &payload),
            Event::AccountTransferFromPeer { entries } => self.handle_account_transfer(entries),
            Event::SetHolderOnline { key, holder } => {
                let _ = self.propose(key, ActionPayload::NodeUp { holder });
            }
            Event::SetHolderOffline { key, holder } => {
                let _ = self.propose(key, ActionPayload::NodeDown { holder });
            }
            Event::RoutingMatrixChanged => {
                let report = ChurnHandler::handle_matrix_changed(&*self.routing, &self.store);
                trace!(
                    "churn: {} keys retained, {} no longer owned",
                    report.keys_retained,
                    report.keys_no_longer_owned
                );
            }
        }
    }

    /// Drains every Sync Resolver's pending local proposals and re-dispatches them. Intended to
    /// be called on a periodic tick from the vault shell's event loop (spec §4.3 bounded
    /// retransmission).
    pub fn retransmit_due(&self) {
        for resolver in self.resolvers.all() {
            for (key, unresolved) in resolver.due_for_retransmit(&self.my_id) {
                let targets = self.group_peers();
                if targets.is_empty() {
                    continue;
                }
                self.dispatcher.send_sync(
                    targets,
                    key,
                    resolver.kind(),
                    crate::utils::serialise(&unresolved.payload),
                    self.my_id,
                    unresolved.attempt_count,
                );
            }
        }
    }

    /// Polls the deadline timer registry and finalizes any Get Operation whose deadline fired
    /// without every expected response arriving.
    pub fn poll_expired_gets(&self) {
        for message_id in self.timers.poll_expired() {
            let op = self.get_ops.lock().expect("lock poisoned").get(&message_id).cloned();
            if let Some(op) = op {
                self.finalize_get(&op);
            }
        }
    }

    // ---- Put -----------------------------------------------------------------------------

    fn handle_put(&self, requester: HolderId, key: DataKey, data: Vec<u8>, message_id: MessageId) {
        let fresh_size = data.len() as u64;
        match self.store.get(&key) {
            Ok(existing) => {
                if key.type_tag.is_unique_on_network() {
                    self.dispatcher
                        .send_put_failure(requester, message_id, Error::UniqueDataClash);
                    return;
                }
                let cost = PlacementEngine::put_cost(existing.size, self.config.replication_factor, false);
                self.dispatcher.send_put_response(requester, message_id, Some(cost));
                let _ = self.propose(key, ActionPayload::Put { type_tag: key.type_tag });
            }
            Err(Error::NotFound) => {
                let cost = PlacementEngine::put_cost(fresh_size, self.config.replication_factor, true);
                let holder = PlacementEngine::choose_initial_holder(&*self.routing, &key.data_id, None);
                match holder {
                    Some(holder) => {
                        let _ = self.propose(key, ActionPayload::Put { type_tag: key.type_tag });
                        self.pending_puts.lock().expect("lock poisoned").insert(
                            message_id,
                            PendingPut {
                                requester,
                                data: data.clone(),
                                tried: std::iter::once(holder).collect(),
                            },
                        );
                        let mut targets = BTreeSet::new();
                        targets.insert(holder);
                        self.dispatcher.send_put_request(targets, key, data, message_id);
                        self.dispatcher.send_put_response(requester, message_id, Some(cost));
                    }
                    None => {
                        self.dispatcher
                            .send_put_failure(requester, message_id, Error::HolderTimeout);
                    }
                }
            }
            Err(err) => warn!("store lookup failed during Put: {:?}", err),
        }
    }

    fn handle_put_response(&self, holder: HolderId, key: DataKey, message_id: MessageId, size: u64) {
        if let Submitted::Resolved { new_entry, .. } =
            self.propose(key, ActionPayload::AddHolder { holder, size })
        {
            if let Some(entry) = new_entry {
                if entry.online_holders.len() >= self.config.replication_factor {
                    let _ = self.pending_puts.lock().expect("lock poisoned").remove(&message_id);
                }
            }
        }
    }

    fn handle_put_failure(&self, holder: HolderId, key: DataKey, message_id: MessageId, error: Error) {
        let mut pending_puts = self.pending_puts.lock().expect("lock poisoned");
        let pending = match pending_puts.get_mut(&message_id) {
            Some(pending) => pending,
            None => {
                warn!("Put failure for an untracked message id {}: {:?}", message_id, error);
                return;
            }
        };
        pending.tried.insert(holder);
        match PlacementEngine::choose_replacement(&*self.routing, &pending.tried, holder) {
            Some(replacement) => {
                pending.tried.insert(replacement);
                let data = pending.data.clone();
                drop(pending_puts);
                let mut targets = BTreeSet::new();
                targets.insert(replacement);
                self.dispatcher.send_put_request(targets, key, data, message_id);
            }
            None => {
                let requester = pending.requester;
                drop(pending_puts);
                self.pending_puts.lock().expect("lock poisoned").remove(&message_id);
                self.dispatcher.send_put_failure(requester, message_id, error);
            }
        }
    }

    // ---- Get -------------------------------------------------------------------------------

    fn handle_get(&self, requester: HolderId, key: DataKey, message_id: MessageId) {
        let entry = match self.store.get(&key) {
            Ok(entry) => entry,
            Err(Error::NotFound) => {
                warn!("Get for unknown key {:?}: dropping silently", key);
                return;
            }
            Err(err) => {
                warn!("store lookup failed during Get: {:?}", err);
                return;
            }
        };

        let mut online = entry.online_holders.clone();
        if self.config.deranking_enabled() {
            let reputation = self.reputation.lock().expect("lock poisoned");
            online.retain(|holder| !reputation.contains(holder));
        }
        if online.is_empty() {
            self.dispatcher.send_get_response_failure(requester, message_id);
            return;
        }

        let content_source = match PlacementEngine::choose_read_source(&*self.routing, &mut online, &key.data_id) {
            Some(holder) => holder,
            None => {
                self.dispatcher.send_get_response_failure(requester, message_id);
                return;
            }
        };

        let mut challenges = BTreeMap::new();
        {
            let mut rng = self.rng.lock().expect("lock poisoned");
            for holder in &online {
                challenges.insert(*holder, random_nonce(&mut *rng));
            }
        }

        let op = Arc::new(GetOperation::new(
            key,
            requester,
            message_id,
            content_source,
            challenges.clone(),
            self.config.get_deadline_ms,
        ));
        if !self.timers.register(message_id, op.expected_count(), self.config.get_deadline_ms) {
            warn!("Get Operation bound reached; dropping request for {:?}", key);
            return;
        }
        self.get_ops.lock().expect("lock poisoned").insert(message_id, op);

        self.dispatcher.send_get_request(content_source, message_id);
        for (holder, nonce) in challenges {
            self.dispatcher
                .send_integrity_check(holder, message_id, IntegrityCheck { nonce });
        }
    }

    fn handle_get_response(&self, holder: HolderId, message_id: MessageId, content: Option<Vec<u8>>) {
        let op = self.get_ops.lock().expect("lock poisoned").get(&message_id).cloned();
        let op = match op {
            Some(op) => op,
            None => {
                trace!("Get response for an unknown or already-finalized message id {}", message_id);
                return;
            }
        };

        let advanced = if holder == op.content_source {
            op.record_content_response(content)
        } else {
            match content {
                Some(reported) => op.record_challenge_response(&holder, reported),
                None => false,
            }
        };
        if advanced {
            let _ = self.timers.tick(&message_id);
        }
        if op.ready_to_finalize() {
            self.finalize_get(&op);
        }
    }

    fn finalize_get(&self, op: &Arc<GetOperation>) {
        let outcome = match op.finalize() {
            Some(outcome) => outcome,
            None => return,
        };
        self.get_ops.lock().expect("lock poisoned").remove(&op.message_id);

        match outcome.content {
            Some(content) => {
                self.dispatcher
                    .send_get_response_success(op.requestor, op.message_id, content.clone());
                self.dispatcher.send_put_to_cache(content);
            }
            None => {
                self.dispatcher.send_get_response_failure(op.requestor, op.message_id);
                if self.config.enable_peer_cache_fallback {
                    trace!("peer cache fallback enabled but no cache collaborator is wired up locally");
                }
            }
        }

        for holder in outcome.tampering_holders {
            self.strike_holder(op.key, holder);
            self.dispatcher.send_false_data_notification(holder, op.message_id);
        }
        for holder in outcome.timed_out_holders {
            let _ = self.propose(op.key, ActionPayload::NodeDown { holder });
        }
    }

    /// De-ranks and removes a holder on its first detected integrity failure (spec §4.6, §7:
    /// never escalated, never a repeated-offense threshold).
    fn strike_holder(&self, key: DataKey, holder: HolderId) {
        self.reputation.lock().expect("lock poisoned").insert(holder);
        let _ = self.propose(key, ActionPayload::RemoveHolder { holder });
    }

    // ---- Delete ------------------------------------------------------------------------------

    fn handle_delete(&self, key: DataKey, message_id: MessageId) {
        if !self.store.exists(&key) {
            trace!("Delete for an absent key {:?}: no-op", key);
            return;
        }
        if let Submitted::Resolved {
            holders_before,
            post_hook: Some(PostHook::IssueHolderDeletes),
            ..
        } = self.propose(key, ActionPayload::Delete)
        {
            if !holders_before.is_empty() {
                self.dispatcher.send_delete_request(holders_before, message_id);
            }
        }
    }

    // ---- Peer synchronisation and account transfer --------------------------------------------

    fn handle_sync(&self, proposer: HolderId, key: DataKey, kind: ActionKind, payload_bytes: &[u8]) {
        let payload: ActionPayload = match bincode::deserialize(payload_bytes) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("dropping malformed Sync payload: {}", err);
                return;
            }
        };
        if payload.kind() != kind {
            warn!("Sync kind/payload mismatch from {:?}; dropping", proposer);
            return;
        }
        let resolver = self.resolvers.for_kind(kind);
        if let ProposalOutcome::Resolved(resolved) = resolver.add_proposal(key, payload, proposer) {
            if let Submitted::Resolved {
                holders_before,
                post_hook: Some(PostHook::IssueHolderDeletes),
                ..
            } = self.apply_resolved(key, resolved)
            {
                if !holders_before.is_empty() {
                    // No client message id to correlate with here: a peer-driven resolution
                    // fires the holder-side cleanup fire-and-forget.
                    self.dispatcher.send_delete_request(holders_before, 0);
                }
            }
        }
    }

    fn handle_account_transfer(&self, entries: Vec<(DataKey, Vec<u8>)>) {
        for (key, serialized) in entries {
            if self.store.exists(&key) {
                continue;
            }
            match bincode::deserialize::<MetadataEntry>(&serialized) {
                Ok(entry) => {
                    if let Err(err) = self.store.put(&key, &entry) {
                        warn!("account transfer: failed to seed {:?}: {:?}", key, err);
                    }
                }
                Err(err) => warn!("account transfer: malformed entry for {:?}: {}", key, err),
            }
        }
    }

    // ---- shared proposal plumbing ---------------------------------------------------------

    /// Submits a proposal as this node, applying it immediately if quorum is already reached
    /// locally (e.g. `quorum == 1`), otherwise broadcasting a Sync to the rest of the Data
    /// Manager group for spec §4.3's eventual convergence.
    fn propose(&self, key: DataKey, payload: ActionPayload) -> Submitted {
        let resolver = self.resolvers.for_kind(payload.kind());
        match resolver.add_proposal(key, payload.clone(), self.my_id) {
            ProposalOutcome::Duplicate => Submitted::Pending,
            ProposalOutcome::Pending => {
                let targets = self.group_peers();
                if !targets.is_empty() {
                    self.dispatcher.send_sync(
                        targets,
                        key,
                        payload.kind(),
                        crate::utils::serialise(&payload),
                        self.my_id,
                        0,
                    );
                }
                Submitted::Pending
            }
            ProposalOutcome::Resolved(resolved) => self.apply_resolved(key, resolved),
        }
    }

    fn apply_resolved(&self, key: DataKey, payload: ActionPayload) -> Submitted {
        let mut holders_before = BTreeSet::new();
        let mut hook = None;
        let result = self.store.mutate(&key, |entry| {
            if let Some(ref e) = entry {
                holders_before = e.online_holders.union(&e.offline_holders).copied().collect();
            }
            let (next, post_hook) = crate::data_manager::action_log::apply(entry, &payload)?;
            hook = post_hook;
            Ok(next)
        });
        match result {
            Ok(new_entry) => Submitted::Resolved {
                new_entry,
                holders_before,
                post_hook: hook,
            },
            Err(err) => {
                warn!("resolved action failed to apply for {:?}: {:?}", key, err);
                Submitted::Pending
            }
        }
    }

    /// Draws up to `group_size - 1` distinct connected peers (excluding self) to receive a Sync
    /// broadcast. The routing collaborator exposes no direct group-membership query (spec §6
    /// restricts it to closeness/connectivity questions), so group membership is approximated by
    /// repeated `random_connected_peer` draws, same pattern as placement's reject-sampling.
    fn group_peers(&self) -> BTreeSet<HolderId> {
        let target = self.routing.group_size().saturating_sub(1);
        let mut peers = BTreeSet::new();
        if target == 0 {
            return peers;
        }
        for _ in 0..(target * 4).max(8) {
            if peers.len() >= target {
                break;
            }
            match self.routing.random_connected_peer() {
                Some(peer) if peer != self.my_id => {
                    peers.insert(peer);
                }
                Some(_) => continue,
                None => break,
            }
        }
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_manager::dispatcher::Dispatcher;
    use crate::routing::mock::MockRoutingOracle;
    use crate::routing::XorName;
    use std::sync::mpsc::{channel, Receiver};
    use tempdir::TempDir;

    /// Builds a single-node `Service` with `quorum == 1`, so every local proposal resolves
    /// synchronously on the first vote (no peer round-trip needed to exercise the apply path).
    fn service(replication_factor: usize) -> (Service, Receiver<crate::action::Action>, TempDir) {
        let dir = TempDir::new("service").unwrap();
        let mut config = Config::default();
        config.replication_factor = replication_factor;
        config.set_quorum(1);
        config.set_root_dir(dir.path());
        let (tx, rx) = channel();
        let oracle = MockRoutingOracle::new(XorName([0; 32]), replication_factor, replication_factor);
        oracle.add_connected_peer(XorName([2; 32]));
        let routing: Arc<dyn RoutingOracle> = Arc::new(oracle);
        let dispatcher = Dispatcher::new(Box::new(tx));
        let svc = Service::new(dir.path(), Init::New, config, routing, dispatcher).unwrap();
        (svc, rx, dir)
    }

    fn drain(rx: &Receiver<crate::action::Action>) -> Vec<crate::action::Action> {
        let mut actions = Vec::new();
        while let Ok(action) = rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    #[test]
    fn fresh_put_creates_entry_and_dispatches_request_and_response() {
        let (svc, rx, _dir) = service(1);
        let key = DataKey::new(XorName([1; 32]), TypeTag::ImmutableChunk);
        svc.handle_event(Event::PutRequestFromOrigin {
            requester: XorName([9; 32]),
            key,
            data: vec![1, 2, 3, 4],
            message_id: 1,
        });

        let entry = svc.store.get(&key).unwrap();
        assert_eq!(entry.ref_count, 1);

        let actions = drain(&rx);
        assert!(actions
            .iter()
            .any(|a| matches!(a, crate::action::Action::SendPutRequest { .. })));
        assert!(actions.iter().any(|a| matches!(
            a,
            crate::action::Action::SendPutResponse { cost: Some(StorageCost(4)), .. }
        )));
    }

    #[test]
    fn duplicate_put_of_unique_type_is_a_clash() {
        let (svc, rx, _dir) = service(1);
        let key = DataKey::new(XorName([1; 32]), TypeTag::MutableBlock);
        svc.handle_event(Event::PutRequestFromOrigin {
            requester: XorName([9; 32]),
            key,
            data: vec![1, 2, 3, 4],
            message_id: 1,
        });
        let _ = drain(&rx);

        svc.handle_event(Event::PutRequestFromOrigin {
            requester: XorName([9; 32]),
            key,
            data: vec![1, 2, 3, 4],
            message_id: 2,
        });
        let actions = drain(&rx);
        assert!(actions
            .iter()
            .any(|a| matches!(a, crate::action::Action::SendPutFailure { error: Error::UniqueDataClash, .. })));
    }

    #[test]
    fn put_response_adds_holder_and_get_then_returns_content() {
        let (svc, rx, _dir) = service(1);
        let key = DataKey::new(XorName([1; 32]), TypeTag::ImmutableChunk);
        svc.handle_event(Event::PutRequestFromOrigin {
            requester: XorName([9; 32]),
            key,
            data: vec![5, 6, 7],
            message_id: 1,
        });
        let _ = drain(&rx);

        svc.handle_event(Event::PutResponseFromStorageGroup {
            holder: XorName([2; 32]),
            key,
            message_id: 1,
            size: 3,
        });
        let entry = svc.store.get(&key).unwrap();
        assert!(entry.online_holders.contains(&XorName([2; 32])));

        svc.handle_event(Event::GetRequestFromClient {
            requester: XorName([9; 32]),
            key,
            message_id: 2,
        });
        let actions = drain(&rx);
        assert!(actions
            .iter()
            .any(|a| matches!(a, crate::action::Action::SendGetRequest { target, .. } if *target == XorName([2; 32]))));

        svc.handle_event(Event::GetResponseFromHolder {
            holder: XorName([2; 32]),
            message_id: 2,
            content: Some(vec![5, 6, 7]),
        });
        let actions = drain(&rx);
        assert!(actions.iter().any(
            |a| matches!(a, crate::action::Action::SendGetResponseSuccess { content, .. } if content == &vec![5, 6, 7])
        ));
    }

    #[test]
    fn get_for_unknown_key_is_silently_dropped() {
        let (svc, rx, _dir) = service(1);
        let key = DataKey::new(XorName([1; 32]), TypeTag::ImmutableChunk);
        svc.handle_event(Event::GetRequestFromClient {
            requester: XorName([9; 32]),
            key,
            message_id: 1,
        });
        assert!(drain(&rx).is_empty());
    }
}
