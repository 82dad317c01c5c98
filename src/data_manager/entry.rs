// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C1: the per-datum Metadata Entry. Generalized from the teacher's `idata_handler::ChunkMetadata`
//! (a bare `holders: BTreeSet<XorName>`) into the online/offline partition and ref-counting
//! spec §3 requires.

use crate::routing::HolderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selects a datum's kind; drives serialization, the unique-on-network predicate, and
/// post-resolution side effects (spec §9 "dynamic per-datum-type dispatch").
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
pub enum TypeTag {
    /// Content-addressed, immutable; duplicate Puts of identical data collapse to a ref bump.
    ImmutableChunk,
    /// Mutable, owner-signed; unique-on-network.
    MutableBlock,
    /// Signed-key variants; unique-on-network.
    SignedKeyOwner,
    SignedKeyMaid,
    SignedKeyPmid,
}

impl TypeTag {
    /// Whether a second Put of a datum under this tag, with the same key, is a clash rather than
    /// a reference bump (spec §4.2).
    pub fn is_unique_on_network(self) -> bool {
        !matches!(self, TypeTag::ImmutableChunk)
    }
}

/// The per-datum value. Holder sets are not expected to exceed `replication_factor` once
/// settled; the invariant is asserted by `debug_assert_invariants` and property-tested in
/// `tests/`.
#[derive(Clone, Default, Serialize, Deserialize, Debug)]
pub struct MetadataEntry {
    pub size: u64,
    pub online_holders: BTreeSet<HolderId>,
    pub offline_holders: BTreeSet<HolderId>,
    pub ref_count: u64,
}

impl MetadataEntry {
    pub fn new_with_size(size: u64) -> Self {
        Self {
            size,
            online_holders: BTreeSet::new(),
            offline_holders: BTreeSet::new(),
            ref_count: 1,
        }
    }

    /// `online ∩ offline = ∅`; `ref_count ≥ 1` while the entry exists; `|online ∪ offline| ≤
    /// replication_factor` in steady state (spec §3). Only checked in debug builds, matching
    /// how the teacher guards invariants with `debug_assert!` rather than runtime checks.
    pub fn debug_assert_invariants(&self, replication_factor: usize) {
        debug_assert!(
            self.online_holders.is_disjoint(&self.offline_holders),
            "online and offline holder sets must be disjoint"
        );
        debug_assert!(self.ref_count >= 1, "ref_count must stay >= 1 while the entry exists");
        debug_assert!(
            self.online_holders.len() + self.offline_holders.len() <= replication_factor,
            "holder set must not exceed the replication factor"
        );
    }

    pub fn is_empty_of_holders(&self) -> bool {
        self.online_holders.is_empty() && self.offline_holders.is_empty()
    }
}

/// Opaque storage-cost scalar returned to the account-holder persona on Put (spec §4.4).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StorageCost(pub u64);

impl StorageCost {
    /// `serialized_size × replication_factor` on a fresh Put, or `serialized_size` alone on a
    /// duplicate Put of a non-unique datum.
    pub fn for_put(serialized_size: u64, replication_factor: usize, is_fresh: bool) -> Self {
        if is_fresh {
            StorageCost(serialized_size * replication_factor as u64)
        } else {
            StorageCost(serialized_size)
        }
    }
}
