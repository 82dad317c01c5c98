// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C8: a narrow outbound interface over routing, plus the deadline timer registry. Grounded on
//! `vault.rs::handle_action` (the match arms are exactly the send_* operations listed here) and,
//! for the timer, on `original_source/data_manager/service.h`'s `routing::Timer<...> get_timer_`
//! field. Retries are the Sync Resolver's job (spec §4.3), not the dispatcher's.

use crate::action::Action;
use crate::routing::HolderId;
use crate::rpc::{DataKey, IntegrityCheck, MessageId, Rpc};
use crate::data_manager::entry::StorageCost;
use crate::error::Error;
use fake_clock::{FakeClock as Clock, Instant};
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::Duration;

/// Sink the dispatcher hands completed `Action`s to. In production this is the vault shell's
/// send queue; in tests it can be a channel the test drains.
pub trait ActionSink: Send + Sync {
    fn send(&self, action: Action);
}

impl ActionSink for Sender<Action> {
    fn send(&self, action: Action) {
        let _ = Sender::send(self, action);
    }
}

/// Thin wrapper over an `ActionSink`. Every method here corresponds to one entry of the spec's
/// §4.8 outbound dispatch set.
pub struct Dispatcher {
    sink: Box<dyn ActionSink>,
}

impl Dispatcher {
    pub fn new(sink: Box<dyn ActionSink>) -> Self {
        Self { sink }
    }

    pub fn send_put_request(&self, targets: BTreeSet<HolderId>, key: DataKey, data: Vec<u8>, message_id: MessageId) {
        self.sink.send(Action::SendPutRequest {
            targets,
            rpc: Rpc::PutRequest { key, data, message_id },
        });
    }

    pub fn send_put_response(&self, target: HolderId, message_id: MessageId, cost: Option<StorageCost>) {
        self.sink.send(Action::SendPutResponse { target, message_id, cost });
    }

    pub fn send_put_failure(&self, target: HolderId, message_id: MessageId, error: Error) {
        self.sink.send(Action::SendPutFailure { target, message_id, error });
    }

    pub fn send_get_request(&self, target: HolderId, message_id: MessageId) {
        self.sink.send(Action::SendGetRequest { target, message_id });
    }

    pub fn send_integrity_check(&self, target: HolderId, message_id: MessageId, check: IntegrityCheck) {
        self.sink.send(Action::SendIntegrityCheck { target, message_id, check });
    }

    pub fn send_get_response_success(&self, target: HolderId, message_id: MessageId, content: Vec<u8>) {
        self.sink.send(Action::SendGetResponseSuccess { target, message_id, content });
    }

    pub fn send_get_response_failure(&self, target: HolderId, message_id: MessageId) {
        self.sink.send(Action::SendGetResponseFailure { target, message_id });
    }

    pub fn send_delete_request(&self, targets: BTreeSet<HolderId>, message_id: MessageId) {
        self.sink.send(Action::SendDeleteRequest { targets, message_id });
    }

    pub fn send_false_data_notification(&self, target: HolderId, message_id: MessageId) {
        self.sink.send(Action::SendFalseDataNotification { target, message_id });
    }

    pub fn send_put_to_cache(&self, content: Vec<u8>) {
        self.sink.send(Action::SendPutToCache { content });
    }

    pub fn send_sync(&self, targets: BTreeSet<HolderId>, key: DataKey, kind: crate::data_manager::action_log::ActionKind, payload: Vec<u8>, proposer: HolderId, attempt: u32) {
        self.sink.send(Action::SendSync {
            targets,
            rpc: Rpc::Sync { key, kind, payload, proposer, attempt },
        });
    }
}

/// A timer-registered waiter: remaining expected responses and the deadline.
struct TimerEntry {
    remaining_count: usize,
    deadline: Instant,
}

/// Maps `message-id -> (remaining_count, deadline)` (spec §4.8). The callback itself is not
/// stored here — callers invoke `DeadlineTimerRegistry::poll_expired` and drive completion
/// through the Get Operation / Sync Resolver directly, avoiding a boxed-closure callback that
/// would need to outlive the registry.
pub struct DeadlineTimerRegistry {
    entries: Mutex<HashMap<MessageId, TimerEntry>>,
    max_concurrent: usize,
}

impl DeadlineTimerRegistry {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_concurrent,
        }
    }

    /// Registers `message_id` with `expected_count` remaining responses and a deadline
    /// `timeout_ms` from now. Returns `false` (and does not register) if the node is already at
    /// its concurrent Get Operation bound (spec §5 resource limits).
    pub fn register(&self, message_id: MessageId, expected_count: usize, timeout_ms: u64) -> bool {
        let mut entries = self.entries.lock().expect("timer registry lock poisoned");
        if entries.len() >= self.max_concurrent {
            return false;
        }
        let _ = entries.insert(
            message_id,
            TimerEntry {
                remaining_count: expected_count,
                deadline: Clock::now() + Duration::from_millis(timeout_ms),
            },
        );
        true
    }

    /// Decrements the remaining count for `message_id`. Returns `true` if this was the final
    /// expected response (`remaining_count` hit zero), in which case the entry is removed.
    pub fn tick(&self, message_id: &MessageId) -> bool {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let done = if let Some(entry) = entries.get_mut(message_id) {
            entry.remaining_count = entry.remaining_count.saturating_sub(1);
            entry.remaining_count == 0
        } else {
            false
        };
        if done {
            let _ = entries.remove(message_id);
        }
        done
    }

    /// Returns every `message_id` whose deadline has fired, removing them from the registry.
    pub fn poll_expired(&self) -> Vec<MessageId> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let now = Clock::now();
        let expired: Vec<MessageId> = entries
            .iter()
            .filter(|(_, entry)| now >= entry.deadline)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            let _ = entries.remove(id);
        }
        expired
    }

    pub fn is_registered(&self, message_id: &MessageId) -> bool {
        self.entries.lock().expect("lock poisoned").contains_key(message_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_to_zero_removes_and_reports_completion() {
        let registry = DeadlineTimerRegistry::new(10);
        assert!(registry.register(1, 2, 5000));
        assert!(!registry.tick(&1));
        assert!(registry.tick(&1));
        assert!(!registry.is_registered(&1));
    }

    #[test]
    fn concurrent_bound_rejects_registration_past_the_limit() {
        let registry = DeadlineTimerRegistry::new(1);
        assert!(registry.register(1, 1, 1000));
        assert!(!registry.register(2, 1, 1000));
    }
}
