// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C7: reacts to routing-matrix change events by re-evaluating per-key responsibility.
//! Grounded on `vault.rs`'s `MemberLeft` handling (which walks `idata_handler`'s metadata to
//! find every chunk the departing node held) and on
//! `original_source/data_manager/service.h::HandleChurnEvent`.

use crate::data_manager::store::MetadataStore;
use crate::routing::RoutingOracle;
use log::trace;

/// Stateless beyond the matrix snapshot the routing oracle already owns (spec §4.7): every call
/// re-derives responsibility from the oracle and the store, rather than caching anything here.
pub struct ChurnHandler;

/// A key this node is no longer responsible for after a matrix change. No action is taken for
/// these (spec §4.7: "the departing node simply stops writing"); the caller surfaces this list
/// only for observability/logging.
pub struct ChurnReport {
    pub keys_retained: usize,
    pub keys_no_longer_owned: usize,
}

impl ChurnHandler {
    /// Re-evaluates responsibility for every key this node currently holds metadata for. Newly
    /// acquired responsibility for a key is not handled here: the Sync Resolver's ongoing
    /// proposals from peer Data Managers are what converges the local store (spec §4.7), so this
    /// handler only has to notice keys it should stop serving.
    pub fn handle_matrix_changed(routing: &dyn RoutingOracle, store: &MetadataStore) -> ChurnReport {
        let mut keys_retained = 0;
        let mut keys_no_longer_owned = 0;
        for key in store.keys() {
            if routing.closest_to(&key.data_id) {
                keys_retained += 1;
            } else {
                keys_no_longer_owned += 1;
                trace!("no longer responsible for {:?}; will stop writing to it", key);
            }
        }
        ChurnReport {
            keys_retained,
            keys_no_longer_owned,
        }
    }
}
