// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C6: in-flight state for one read. Generalized from the teacher's `idata_op::IDataOp`
//! (request + per-holder `RpcState`) to add the integrity-challenge aggregation of spec §4.6;
//! grounded on `original_source/data_manager/service.h`'s `GetResponseOp` /
//! `AssessIntegrityCheckResults` for the two-phase (content + challenges) shape.

use crate::routing::HolderId;
use crate::rpc::DataKey;
use fake_clock::{FakeClock as Clock, Instant};
use hmac::{Hmac, Mac};
use rand::{CryptoRng, Rng};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// `HMAC(nonce, content)`, the keyed-hash integrity-check primitive of spec §4.6.
pub fn recompute_challenge(nonce: &[u8; 32], content: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(nonce).expect("HMAC accepts any key length");
    mac.update(content);
    mac.finalize().into_bytes().to_vec()
}

pub fn random_nonce<R: CryptoRng + Rng>(rng: &mut R) -> [u8; 32] {
    let mut nonce = [0u8; 32];
    rng.fill(&mut nonce);
    nonce
}

/// A challenge posed to one holder, and its eventual outcome.
#[derive(Debug, Clone)]
pub enum ChallengeState {
    Pending { nonce: [u8; 32] },
    Responded { nonce: [u8; 32], reported: Vec<u8> },
    TimedOut { nonce: [u8; 32] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Issued,
    AwaitingContentAndChallenges,
    Completed,
}

/// Outcome reported to the requestor and the churn/reputation bookkeeping once a Get Operation
/// finalizes.
#[derive(Debug)]
pub struct GetOutcome {
    pub content: Option<Vec<u8>>,
    /// Holders to de-rank and remove, because their challenge response didn't match (tampering
    /// or stale data).
    pub tampering_holders: Vec<HolderId>,
    /// Holders to mark down, because they never answered (content source or challenge timeout).
    pub timed_out_holders: Vec<HolderId>,
}

/// Ephemeral, in-memory-only state for one read (spec §3). Referenced by the timer and by each
/// incoming-response handler (spec §9's "shared ownership of Get Operation"); callers are
/// expected to hold this behind an `Arc<GetOperation>` and only ever lock the inner `Mutex`
/// belonging to this one operation (spec §5 — "no Get Operation's lock is ever taken while
/// another's is held").
pub struct GetOperation {
    pub key: DataKey,
    pub requestor: HolderId,
    pub message_id: u64,
    pub content_source: HolderId,
    inner: Mutex<Inner>,
}

struct Inner {
    stage: Stage,
    challenges: BTreeMap<HolderId, ChallengeState>,
    received_content: Option<Vec<u8>>,
    content_source_responded: bool,
    called_count: usize,
    expected_count: usize,
    deadline: Instant,
}

impl GetOperation {
    pub fn new(
        key: DataKey,
        requestor: HolderId,
        message_id: u64,
        content_source: HolderId,
        challenges: BTreeMap<HolderId, [u8; 32]>,
        deadline_ms: u64,
    ) -> Self {
        let expected_count = 1 + challenges.len();
        let challenges = challenges
            .into_iter()
            .map(|(holder, nonce)| (holder, ChallengeState::Pending { nonce }))
            .collect();
        Self {
            key,
            requestor,
            message_id,
            content_source,
            inner: Mutex::new(Inner {
                stage: Stage::Issued,
                challenges,
                received_content: None,
                content_source_responded: false,
                called_count: 0,
                expected_count,
                deadline: Clock::now() + Duration::from_millis(deadline_ms),
            }),
        }
    }

    pub fn expected_count(&self) -> usize {
        self.inner.lock().expect("lock poisoned").expected_count
    }

    pub fn called_count(&self) -> usize {
        self.inner.lock().expect("lock poisoned").called_count
    }

    pub fn stage(&self) -> Stage {
        self.inner.lock().expect("lock poisoned").stage
    }

    pub fn deadline_elapsed(&self) -> bool {
        let inner = self.inner.lock().expect("lock poisoned");
        Clock::now() >= inner.deadline
    }

    /// Records the content-source's response. Returns `true` if this call advanced
    /// `called_count` (i.e. the operation hadn't already completed).
    pub fn record_content_response(&self, content: Option<Vec<u8>>) -> bool {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.stage == Stage::Completed || inner.content_source_responded {
            return false;
        }
        inner.content_source_responded = true;
        inner.received_content = content;
        inner.called_count += 1;
        if inner.stage == Stage::Issued {
            inner.stage = Stage::AwaitingContentAndChallenges;
        }
        debug_assert!(inner.called_count <= inner.expected_count);
        true
    }

    /// Records a challenge response from `holder`. Returns `true` if this call advanced
    /// `called_count`.
    pub fn record_challenge_response(&self, holder: &HolderId, reported: Vec<u8>) -> bool {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.stage == Stage::Completed {
            return false;
        }
        let nonce = match inner.challenges.get(holder) {
            Some(ChallengeState::Pending { nonce }) => *nonce,
            _ => return false,
        };
        let _ = inner
            .challenges
            .insert(*holder, ChallengeState::Responded { nonce, reported });
        inner.called_count += 1;
        debug_assert!(inner.called_count <= inner.expected_count);
        true
    }

    /// Whether the operation is ready to finalize: either every expected response is in, or the
    /// deadline has fired.
    pub fn ready_to_finalize(&self) -> bool {
        let inner = self.inner.lock().expect("lock poisoned");
        inner.stage != Stage::Completed
            && (inner.called_count == inner.expected_count || Clock::now() >= inner.deadline)
    }

    /// Finalizes the operation exactly once. Subsequent calls return `None` (terminal state
    /// reached; later responses are silently dropped, per spec §4.6's state machine).
    pub fn finalize(&self) -> Option<GetOutcome> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        if inner.stage == Stage::Completed {
            return None;
        }
        inner.stage = Stage::Completed;

        let content = inner.received_content.clone();
        let mut tampering_holders = Vec::new();
        let mut timed_out_holders = Vec::new();

        if !inner.content_source_responded || content.is_none() {
            timed_out_holders.push(self.content_source);
        }

        if let Some(ref bytes) = content {
            for (holder, state) in inner.challenges.iter() {
                match state {
                    ChallengeState::Pending { .. } => timed_out_holders.push(*holder),
                    ChallengeState::TimedOut { .. } => timed_out_holders.push(*holder),
                    ChallengeState::Responded { nonce, reported } => {
                        let expected = recompute_challenge(nonce, bytes);
                        if &expected != reported {
                            tampering_holders.push(*holder);
                        }
                    }
                }
            }
        }

        Some(GetOutcome {
            content,
            tampering_holders,
            timed_out_holders,
        })
    }
}
