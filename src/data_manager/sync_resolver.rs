// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C4: the per-action-kind quorum collector (spec §4.3). No direct analogue in the teacher,
//! whose phase-1 `IDataHandler` resolves every mutation unilaterally; grounded instead on
//! `original_source/data_manager/service.h`'s `Sync<DataManager::UnresolvedPut>` family — one
//! `Sync<T>` instance per action kind, each independently locked (spec §5).

use crate::data_manager::action_log::{ActionKind, ActionPayload, UnresolvedAction};
use crate::routing::HolderId;
use crate::rpc::DataKey;
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Outcome of submitting a proposal.
#[derive(Debug, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Quorum reached; here is the payload to apply.
    Resolved(ActionPayload),
    /// Still short of quorum.
    Pending,
    /// This exact `(proposer, payload)` was already on file for this key.
    Duplicate,
}

#[derive(Default)]
struct Proposals {
    /// At most one entry per proposer per key-action, keyed by proposer.
    by_proposer: BTreeMap<HolderId, ActionPayload>,
    /// Retransmission attempts made so far per local proposer (spec §4.3 bounded retransmission).
    retransmit_attempts: BTreeMap<HolderId, u32>,
}

impl Proposals {
    fn agreement_count(&self, payload: &ActionPayload) -> usize {
        self.by_proposer
            .values()
            .filter(|candidate| *candidate == payload)
            .count()
    }
}

/// One resolver per action kind; the kind is fixed at construction so that resolvers of
/// different kinds genuinely never interlock (spec §5 — "resolvers of different kinds never
/// interlock").
pub struct SyncResolver {
    kind: ActionKind,
    quorum: usize,
    retransmit_cap: u32,
    max_unresolved_per_kind: usize,
    /// Bounded map `key -> proposals`; oldest keys evicted on overflow (spec §5 resource
    /// limits). Insertion order is tracked via `eviction_order` since `BTreeMap` does not
    /// remember it.
    proposals: Mutex<HashMap<DataKey, Proposals>>,
    eviction_order: Mutex<Vec<DataKey>>,
}

impl SyncResolver {
    pub fn new(kind: ActionKind, quorum: usize, retransmit_cap: u32, max_unresolved_per_kind: usize) -> Self {
        Self {
            kind,
            quorum,
            retransmit_cap,
            max_unresolved_per_kind,
            proposals: Mutex::new(HashMap::new()),
            eviction_order: Mutex::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// `add_proposal(kind, key, payload, proposer) -> Resolved(action) | Pending | Duplicate`,
    /// per spec §4.3. `kind` is implicit (this resolver's own kind); callers must not submit a
    /// payload of a different kind.
    pub fn add_proposal(
        &self,
        key: DataKey,
        payload: ActionPayload,
        proposer: HolderId,
    ) -> ProposalOutcome {
        debug_assert_eq!(payload.kind(), self.kind, "payload kind must match this resolver");

        let mut proposals = self.proposals.lock().expect("sync resolver lock poisoned");

        if !proposals.contains_key(&key) {
            self.evict_if_full(&mut proposals);
            self.eviction_order.lock().expect("lock poisoned").push(key);
        }
        let entry = proposals.entry(key).or_default();

        if let Some(existing) = entry.by_proposer.get(&proposer) {
            if *existing == payload {
                return ProposalOutcome::Duplicate;
            }
        }
        let _ = entry.by_proposer.insert(proposer, payload.clone());

        if entry.agreement_count(&payload) >= self.quorum {
            drop(proposals);
            self.clear_key(&key);
            ProposalOutcome::Resolved(payload)
        } else {
            ProposalOutcome::Pending
        }
    }

    fn evict_if_full(&self, proposals: &mut HashMap<DataKey, Proposals>) {
        if proposals.len() < self.max_unresolved_per_kind {
            return;
        }
        let mut order = self.eviction_order.lock().expect("lock poisoned");
        if let Some(oldest) = order.first().copied() {
            order.remove(0);
            let _ = proposals.remove(&oldest);
            warn!(
                "sync resolver ({:?}): evicted unresolved proposals for a key on overflow",
                self.kind
            );
        }
    }

    /// Removes all proposals for `key` (called once a proposal resolves, or once the local
    /// proposer gives up after `retransmit_cap` attempts).
    fn clear_key(&self, key: &DataKey) {
        let mut proposals = self.proposals.lock().expect("lock poisoned");
        let _ = proposals.remove(key);
        let mut order = self.eviction_order.lock().expect("lock poisoned");
        order.retain(|k| k != key);
    }

    /// Local proposals still pending, each paired with its incremented attempt count. Proposals
    /// whose local attempt budget is exhausted are dropped here with a logged warning, matching
    /// "exhausted actions are dropped with a logged warning (non-fatal)" (spec §4.3).
    pub fn due_for_retransmit(&self, my_id: &HolderId) -> Vec<(DataKey, UnresolvedAction)> {
        let mut due = Vec::new();
        let mut exhausted = Vec::new();
        {
            let mut proposals = self.proposals.lock().expect("lock poisoned");
            for (key, bucket) in proposals.iter_mut() {
                let payload = match bucket.by_proposer.get(my_id) {
                    Some(payload) => payload.clone(),
                    None => continue,
                };
                let attempts = bucket.retransmit_attempts.entry(*my_id).or_insert(0);
                *attempts += 1;
                if *attempts > self.retransmit_cap {
                    exhausted.push(*key);
                } else {
                    due.push((
                        *key,
                        UnresolvedAction {
                            payload,
                            proposer: *my_id,
                            attempt_count: *attempts,
                        },
                    ));
                }
            }
        }
        for key in exhausted {
            warn!(
                "sync resolver ({:?}): dropping unresolved proposal for a key after {} retransmit attempts",
                self.kind, self.retransmit_cap
            );
            self.clear_key(&key);
        }
        due
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::XorName;

    fn proposer(byte: u8) -> HolderId {
        XorName([byte; 32])
    }

    fn key(byte: u8) -> DataKey {
        use crate::data_manager::entry::TypeTag;
        DataKey::new(XorName([byte; 32]), TypeTag::ImmutableChunk)
    }

    fn add_holder_payload(holder_byte: u8) -> ActionPayload {
        ActionPayload::AddHolder {
            holder: proposer(holder_byte),
            size: 10,
        }
    }

    #[test]
    fn resolves_exactly_once_at_quorum_and_late_duplicate_is_noop() {
        let resolver = SyncResolver::new(ActionKind::AddHolder, 3, 10, 1000);
        let k = key(1);
        let payload = add_holder_payload(9);

        assert_eq!(
            resolver.add_proposal(k, payload.clone(), proposer(1)),
            ProposalOutcome::Pending
        );
        assert_eq!(
            resolver.add_proposal(k, payload.clone(), proposer(2)),
            ProposalOutcome::Pending
        );
        let resolved = resolver.add_proposal(k, payload.clone(), proposer(3));
        assert_eq!(resolved, ProposalOutcome::Resolved(payload.clone()));

        // A fourth, late, identical proposal finds no bucket left to join: treated as a fresh
        // proposal for a new round, not a resolution or duplicate of the old one.
        let outcome = resolver.add_proposal(k, payload, proposer(4));
        assert_eq!(outcome, ProposalOutcome::Pending);
    }

    #[test]
    fn duplicate_proposal_from_same_proposer_is_idempotent() {
        let resolver = SyncResolver::new(ActionKind::AddHolder, 3, 10, 1000);
        let k = key(1);
        let payload = add_holder_payload(9);
        assert_eq!(
            resolver.add_proposal(k, payload.clone(), proposer(1)),
            ProposalOutcome::Pending
        );
        assert_eq!(
            resolver.add_proposal(k, payload, proposer(1)),
            ProposalOutcome::Duplicate
        );
    }

    #[test]
    fn disagreeing_proposals_from_distinct_proposers_do_not_resolve() {
        let resolver = SyncResolver::new(ActionKind::AddHolder, 2, 10, 1000);
        let k = key(1);
        assert_eq!(
            resolver.add_proposal(k, add_holder_payload(1), proposer(1)),
            ProposalOutcome::Pending
        );
        assert_eq!(
            resolver.add_proposal(k, add_holder_payload(2), proposer(2)),
            ProposalOutcome::Pending
        );
    }

    #[test]
    fn retransmit_attempts_increment_and_cap_out() {
        let resolver = SyncResolver::new(ActionKind::AddHolder, 3, 2, 1000);
        let k = key(1);
        let payload = add_holder_payload(9);
        assert_eq!(
            resolver.add_proposal(k, payload, proposer(1)),
            ProposalOutcome::Pending
        );

        let first = resolver.due_for_retransmit(&proposer(1));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].1.attempt_count, 1);

        let second = resolver.due_for_retransmit(&proposer(1));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].1.attempt_count, 2);

        // Third attempt exceeds the cap of 2: the proposal is dropped rather than retransmitted.
        let third = resolver.due_for_retransmit(&proposer(1));
        assert!(third.is_empty());

        let proposals = resolver.proposals.lock().unwrap();
        assert!(!proposals.contains_key(&k));
    }

    #[test]
    fn overflow_evicts_oldest_key() {
        let resolver = SyncResolver::new(ActionKind::AddHolder, 5, 10, 2);
        let _ = resolver.add_proposal(key(1), add_holder_payload(1), proposer(1));
        let _ = resolver.add_proposal(key(2), add_holder_payload(1), proposer(1));
        let _ = resolver.add_proposal(key(3), add_holder_payload(1), proposer(1));
        let proposals = resolver.proposals.lock().unwrap();
        assert!(!proposals.contains_key(&key(1)));
        assert!(proposals.contains_key(&key(3)));
    }
}
