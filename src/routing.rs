// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The overlay routing service is an external collaborator (spec §1, §6): this module only
//! defines the narrow interface the Data Manager consults, plus a deterministic mock used by
//! tests and by the `mock` feature's in-process network.

pub use xor_name::XorName;

/// A data identity: fixed-width, opaque. Aliased to the same underlying type as a holder
/// identity, matching the teacher's convention of using `XorName` for both data and node names.
pub type DataId = XorName;
/// A holder (storage node) identity.
pub type HolderId = XorName;

/// Opaque snapshot of the overlay's neighbourhood structure. The core never inspects its
/// contents directly; it only asks the routing collaborator closeness questions through this
/// handle so that different routing implementations can be swapped in without touching the
/// Data Manager.
pub trait RoutingOracle: Send + Sync {
    /// Is this node one of the closest-K nodes responsible for `id`?
    fn closest_to(&self, id: &DataId) -> bool;

    /// Draw a random peer this node is currently connected to.
    fn random_connected_peer(&self) -> Option<HolderId>;

    /// Given candidate holders and a target id, pick the one closest to the target under the
    /// current matrix. Returns `None` if `candidates` is empty.
    fn choose_closest(&self, candidates: &[HolderId], target: &DataId) -> Option<HolderId>;

    /// This node's own identity.
    fn my_id(&self) -> HolderId;

    /// The target cardinality of the holder set per datum, and the Data Manager group size.
    fn replication_factor(&self) -> usize;
    fn group_size(&self) -> usize;
}

/// Deterministic, in-memory routing oracle for tests and local simulation. Grounded on the
/// teacher's `mock_routing::Node`, generalized away from the `quic_p2p`/routing-crate transport
/// it wrapped: this mock only answers the closeness queries the Data Manager needs.
pub mod mock {
    use super::{DataId, HolderId, RoutingOracle, XorName};
    use std::sync::RwLock;

    /// A swappable snapshot of connected peers, guarded by a dedicated read-mostly lock as §5
    /// requires for the routing-matrix snapshot.
    pub struct MockRoutingOracle {
        my_id: HolderId,
        replication_factor: usize,
        group_size: usize,
        connected_peers: RwLock<Vec<HolderId>>,
        next_peer: std::sync::atomic::AtomicUsize,
    }

    impl MockRoutingOracle {
        pub fn new(my_id: HolderId, replication_factor: usize, group_size: usize) -> Self {
            Self {
                my_id,
                replication_factor,
                group_size,
                connected_peers: RwLock::new(Vec::new()),
                next_peer: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        /// Replace the set of connected peers, simulating a `RoutingMatrixChanged` event.
        pub fn set_connected_peers(&self, peers: Vec<HolderId>) {
            *self.connected_peers.write().expect("lock poisoned") = peers;
        }

        pub fn add_connected_peer(&self, peer: HolderId) {
            self.connected_peers
                .write()
                .expect("lock poisoned")
                .push(peer);
        }
    }

    impl RoutingOracle for MockRoutingOracle {
        fn closest_to(&self, _id: &DataId) -> bool {
            // The mock is always authoritative for every key; a single-section test network has
            // no other Data Manager group to defer to.
            true
        }

        fn random_connected_peer(&self) -> Option<HolderId> {
            use std::sync::atomic::Ordering;
            let peers = self.connected_peers.read().expect("lock poisoned");
            if peers.is_empty() {
                return None;
            }
            // Round-robins through the connected set rather than always returning the same
            // peer, so reject-sampling callers (placement replacement) make progress.
            let idx = self.next_peer.fetch_add(1, Ordering::Relaxed) % peers.len();
            peers.get(idx).copied()
        }

        fn choose_closest(&self, candidates: &[HolderId], target: &DataId) -> Option<HolderId> {
            candidates
                .iter()
                .copied()
                .min_by_key(|candidate| xor_distance(candidate, target))
        }

        fn my_id(&self) -> HolderId {
            self.my_id
        }

        fn replication_factor(&self) -> usize {
            self.replication_factor
        }

        fn group_size(&self) -> usize {
            self.group_size
        }
    }

    fn xor_distance(a: &XorName, b: &XorName) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..32 {
            out[i] = a.0[i] ^ b.0[i];
        }
        out
    }
}
