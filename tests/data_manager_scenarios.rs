// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! End-to-end scenarios against the public `Service` API, one per testable-properties scenario.

use meshvault::data_manager::action_log::ActionKind;
use meshvault::data_manager::dispatcher::Dispatcher;
use meshvault::data_manager::entry::TypeTag;
use meshvault::data_manager::get_op::recompute_challenge;
use meshvault::data_manager::Service;
use meshvault::routing::mock::MockRoutingOracle;
use meshvault::routing::{RoutingOracle, XorName};
use meshvault::rpc::{DataKey, Event};
use meshvault::{Action, Config, Init};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use tempdir::TempDir;

fn id(byte: u8) -> XorName {
    XorName([byte; 32])
}

fn harness(replication_factor: usize, quorum: usize, peers: &[XorName]) -> (Service, Receiver<Action>, TempDir) {
    harness_with_deadline(replication_factor, quorum, peers, 5000)
}

/// Like `harness`, but lets the deadline be set to `0` so a Get Operation's timeout fires
/// immediately on the first `poll_expired_gets` call, instead of mutating the process-global
/// `fake_clock` (which would race against other tests' in-flight deadlines running concurrently
/// in this same test binary).
fn harness_with_deadline(
    replication_factor: usize,
    quorum: usize,
    peers: &[XorName],
    get_deadline_ms: u64,
) -> (Service, Receiver<Action>, TempDir) {
    let dir = TempDir::new("data_manager_scenarios").unwrap();
    let mut config = Config::default();
    config.replication_factor = replication_factor;
    config.set_quorum(quorum);
    config.get_deadline_ms = get_deadline_ms;
    config.set_root_dir(dir.path());

    let oracle = MockRoutingOracle::new(id(0), replication_factor, replication_factor);
    for peer in peers {
        oracle.add_connected_peer(*peer);
    }
    let routing: Arc<dyn RoutingOracle> = Arc::new(oracle);

    let (tx, rx) = channel();
    let dispatcher = Dispatcher::new(Box::new(tx));
    let service = Service::new(dir.path(), Init::New, config, routing, dispatcher).unwrap();
    (service, rx, dir)
}

fn drain(rx: &Receiver<Action>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Ok(action) = rx.try_recv() {
        actions.push(action);
    }
    actions
}

/// Scenario 1: happy-path Put with 4 eventual holders.
#[test]
fn happy_path_put_four_holders() {
    let holders = [id(2), id(3), id(4), id(5)];
    let (service, rx, _dir) = harness(4, 1, &holders);
    let key = DataKey::new(id(1), TypeTag::ImmutableChunk);

    service.handle_event(Event::PutRequestFromOrigin {
        requester: id(9),
        key,
        data: vec![0u8; 1024],
        message_id: 1,
    });

    let actions = drain(&rx);
    assert!(actions.iter().any(|a| matches!(a, Action::SendPutRequest { .. })));
    assert!(actions
        .iter()
        .any(|a| matches!(a, Action::SendPutResponse { cost: Some(cost), .. } if cost.0 == 4096)));

    for holder in &holders {
        service.handle_event(Event::PutResponseFromStorageGroup {
            holder: *holder,
            key,
            message_id: 1,
            size: 1024,
        });
    }
    let _ = drain(&rx);

    service.handle_event(Event::GetRequestFromClient {
        requester: id(9),
        key,
        message_id: 2,
    });
    let actions = drain(&rx);
    assert!(actions.iter().any(|a| matches!(
        a,
        Action::SendGetRequest { target, .. } if holders.contains(target)
    )));
}

/// Scenario 2: a second Put of a unique-on-network datum whose key already exists clashes.
#[test]
fn unique_data_clash() {
    let (service, rx, _dir) = harness(4, 1, &[id(2)]);
    let key = DataKey::new(id(1), TypeTag::MutableBlock);

    service.handle_event(Event::PutRequestFromOrigin {
        requester: id(9),
        key,
        data: vec![1, 2, 3],
        message_id: 1,
    });
    let _ = drain(&rx);

    service.handle_event(Event::PutRequestFromOrigin {
        requester: id(9),
        key,
        data: vec![1, 2, 3],
        message_id: 2,
    });
    let actions = drain(&rx);
    assert!(actions.iter().any(|a| matches!(
        a,
        Action::SendPutFailure { error: meshvault::Error::UniqueDataClash, .. }
    )));
}

/// Scenario 3: one of three challenged holders returns a mismatched scalar.
#[test]
fn integrity_failure_deranks_and_notifies_the_faulty_holder() {
    // Closest to data id(1) among {2,3,4,5} is id(3) (distance 2 under elementwise XOR), so it
    // becomes the content source; the rest are challenged.
    let holders = [id(2), id(3), id(4), id(5)];
    let (service, rx, _dir) = harness(4, 1, &holders);
    let key = DataKey::new(id(1), TypeTag::ImmutableChunk);
    let content = vec![7u8, 8, 9];

    for holder in &holders {
        service.handle_event(Event::PutResponseFromStorageGroup {
            holder: *holder,
            key,
            message_id: 1,
            size: content.len() as u64,
        });
    }
    let _ = drain(&rx);

    service.handle_event(Event::GetRequestFromClient {
        requester: id(9),
        key,
        message_id: 2,
    });
    let actions = drain(&rx);

    let content_source = actions
        .iter()
        .find_map(|a| match a {
            Action::SendGetRequest { target, .. } => Some(*target),
            _ => None,
        })
        .expect("a get request was dispatched to the content source");
    assert_eq!(content_source, id(3));

    let mut nonces = Vec::new();
    for action in &actions {
        if let Action::SendIntegrityCheck { target, check, .. } = action {
            nonces.push((*target, check.nonce));
        }
    }
    assert_eq!(nonces.len(), 3);

    service.handle_event(Event::GetResponseFromHolder {
        holder: content_source,
        message_id: 2,
        content: Some(content.clone()),
    });

    let faulty = id(4);
    for (holder, nonce) in &nonces {
        let reported = if *holder == faulty {
            vec![0u8; 32]
        } else {
            recompute_challenge(nonce, &content)
        };
        service.handle_event(Event::GetResponseFromHolder {
            holder: *holder,
            message_id: 2,
            content: Some(reported),
        });
    }

    let actions = drain(&rx);
    assert!(actions.iter().any(|a| matches!(
        a,
        Action::SendGetResponseSuccess { content: c, .. } if *c == content
    )));
    assert!(actions
        .iter()
        .any(|a| matches!(a, Action::SendFalseDataNotification { target, .. } if *target == faulty)));

    // The RemoveHolder action resolved synchronously (quorum 1): a follow-up Get no longer
    // challenges the faulty holder, since it has been dropped from the entry's online holders.
    service.handle_event(Event::GetRequestFromClient {
        requester: id(9),
        key,
        message_id: 3,
    });
    let actions = drain(&rx);
    assert!(!actions
        .iter()
        .any(|a| matches!(a, Action::SendIntegrityCheck { target, .. } if *target == faulty)));
    assert!(!actions.iter().any(|a| matches!(a, Action::SendGetRequest { target, .. } if *target == faulty)));
}

/// Scenario 4: the content source never responds before the deadline.
#[test]
fn holder_down_on_read_times_out_without_challenge_removals() {
    let holders = [id(2), id(3)];
    let (service, rx, _dir) = harness_with_deadline(2, 1, &holders, 0);
    let key = DataKey::new(id(1), TypeTag::ImmutableChunk);

    for holder in &holders {
        service.handle_event(Event::PutResponseFromStorageGroup {
            holder: *holder,
            key,
            message_id: 1,
            size: 4,
        });
    }
    let _ = drain(&rx);

    service.handle_event(Event::GetRequestFromClient {
        requester: id(9),
        key,
        message_id: 2,
    });
    let _ = drain(&rx);

    service.poll_expired_gets();

    let actions = drain(&rx);
    assert!(actions.iter().any(|a| matches!(a, Action::SendGetResponseFailure { .. })));
    assert!(!actions.iter().any(|a| matches!(a, Action::SendFalseDataNotification { .. })));
}

/// Scenario 5: three distinct proposers agreeing on the same AddHolder resolve it exactly once;
/// a fourth, late, identical proposal is a no-op.
#[test]
fn resolver_reaches_quorum_exactly_once() {
    let (service, rx, _dir) = harness(4, 3, &[id(2)]);
    let key = DataKey::new(id(1), TypeTag::ImmutableChunk);
    let payload = meshvault::data_manager::action_log::ActionPayload::AddHolder {
        holder: id(6),
        size: 10,
    };
    let payload_bytes = bincode::serialize(&payload).unwrap();

    for proposer in [id(11), id(12), id(13), id(14)] {
        service.handle_event(Event::SynchroniseFromPeer {
            proposer,
            key,
            kind: ActionKind::AddHolder,
            payload: payload_bytes.clone(),
        });
    }
    let _ = drain(&rx);

    service.handle_event(Event::GetRequestFromClient {
        requester: id(9),
        key,
        message_id: 1,
    });
    let actions = drain(&rx);
    assert!(actions
        .iter()
        .any(|a| matches!(a, Action::SendGetRequest { target, .. } if *target == id(6))));
}

/// Scenario 6: read-source selection always recomputes from the current online set, so adding a
/// holder nearer the key than the existing one redirects the next Get to it without any caching.
#[test]
fn newly_added_nearer_holder_is_chosen_on_the_next_get() {
    let (service, rx, _dir) = harness(4, 1, &[id(9), id(3)]);
    let key = DataKey::new(id(1), TypeTag::ImmutableChunk);

    // id(9) is far from id(1); it is the only online holder at first.
    service.handle_event(Event::PutResponseFromStorageGroup {
        holder: id(9),
        key,
        message_id: 1,
        size: 4,
    });
    let _ = drain(&rx);

    service.handle_event(Event::GetRequestFromClient {
        requester: id(20),
        key,
        message_id: 2,
    });
    let actions = drain(&rx);
    assert!(actions
        .iter()
        .any(|a| matches!(a, Action::SendGetRequest { target, .. } if *target == id(9))));

    // id(3) is nearer id(1) under elementwise XOR distance; once it joins, churn means the next
    // Get should prefer it over the previously-chosen holder.
    service.handle_event(Event::PutResponseFromStorageGroup {
        holder: id(3),
        key,
        message_id: 1,
        size: 4,
    });
    let _ = drain(&rx);

    service.handle_event(Event::RoutingMatrixChanged);
    let _ = drain(&rx);

    service.handle_event(Event::GetRequestFromClient {
        requester: id(20),
        key,
        message_id: 3,
    });
    let actions = drain(&rx);
    assert!(actions
        .iter()
        .any(|a| matches!(a, Action::SendGetRequest { target, .. } if *target == id(3))));
}
