// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C5: initial placement, failure-driven replacement, and read-source selection. Generalized
//! from the teacher's `idata_handler::make_holder_list_for_idata` (closest-adults-then-elders
//! fallback) into the three operations of spec §4.4.

use crate::data_manager::entry::StorageCost;
use crate::routing::{DataId, HolderId, RoutingOracle};
use std::collections::BTreeSet;

pub struct PlacementEngine;

impl PlacementEngine {
    /// Initial placement for a Put (spec §4.4). `candidate_holder` is the caller-supplied
    /// holder suggestion, if any; it's honored only when this node is the closest to
    /// `data_id` and the candidate is neither the all-zero id nor `data_id` itself.
    pub fn choose_initial_holder(
        routing: &dyn RoutingOracle,
        data_id: &DataId,
        candidate_holder: Option<HolderId>,
    ) -> Option<HolderId> {
        if routing.closest_to(data_id) {
            if let Some(candidate) = candidate_holder {
                if candidate != HolderId::default() && candidate != *data_id {
                    return Some(candidate);
                }
            }
        }
        loop {
            let peer = routing.random_connected_peer()?;
            if peer != *data_id {
                return Some(peer);
            }
        }
    }

    /// Replacement holder on Put failure (spec §4.4): draw random connected peers, rejecting
    /// any member of `current ∪ {offender}`, until one is accepted.
    pub fn choose_replacement(
        routing: &dyn RoutingOracle,
        current: &BTreeSet<HolderId>,
        offender: HolderId,
    ) -> Option<HolderId> {
        let mut avoid = current.clone();
        let _ = avoid.insert(offender);
        // `random_connected_peer` has no notion of rejection sampling of its own, so loop here;
        // bound the attempts so a saturated connected-peer set can't spin forever.
        for _ in 0..1024 {
            let peer = routing.random_connected_peer()?;
            if !avoid.contains(&peer) {
                return Some(peer);
            }
        }
        None
    }

    /// Read-source selection (spec §4.4): pick the online holder closest to `data_id`, removing
    /// it from the set so the caller can pose integrity challenges to the rest.
    pub fn choose_read_source(
        routing: &dyn RoutingOracle,
        online_holders: &mut BTreeSet<HolderId>,
        data_id: &DataId,
    ) -> Option<HolderId> {
        let candidates: Vec<HolderId> = online_holders.iter().copied().collect();
        let chosen = routing.choose_closest(&candidates, data_id)?;
        let _ = online_holders.remove(&chosen);
        Some(chosen)
    }

    /// Authoritative storage cost (spec §4.4): `size × replication_factor` on a fresh Put, or
    /// `size` alone on a duplicate Put of a non-unique datum.
    pub fn put_cost(serialized_size: u64, replication_factor: usize, is_fresh: bool) -> StorageCost {
        StorageCost::for_put(serialized_size, replication_factor, is_fresh)
    }
}
