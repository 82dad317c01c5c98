// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C3: typed unresolved-action objects and their application to a Metadata Entry. Generalized
//! from the teacher's `idata_op::OpType` (a 3-way `Put`/`Get`/`DeleteUnpub` split with no
//! apply logic of its own) into the 6 action kinds of spec §3 plus the `apply` function the
//! teacher only implements ad hoc, inline in `handle_put_idata_resp` and friends.

use crate::data_manager::entry::{MetadataEntry, TypeTag};
use crate::error::{Error, Result};
use crate::routing::HolderId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
pub enum ActionKind {
    Put,
    Delete,
    AddHolder,
    RemoveHolder,
    NodeDown,
    NodeUp,
}

/// Payload carried by an unresolved/resolved action. Each variant carries only the fields
/// needed to transform an Entry (spec §4.2).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum ActionPayload {
    Put { type_tag: TypeTag },
    Delete,
    AddHolder { holder: HolderId, size: u64 },
    RemoveHolder { holder: HolderId },
    NodeDown { holder: HolderId },
    NodeUp { holder: HolderId },
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::Put { .. } => ActionKind::Put,
            ActionPayload::Delete => ActionKind::Delete,
            ActionPayload::AddHolder { .. } => ActionKind::AddHolder,
            ActionPayload::RemoveHolder { .. } => ActionKind::RemoveHolder,
            ActionPayload::NodeDown { .. } => ActionKind::NodeDown,
            ActionPayload::NodeUp { .. } => ActionKind::NodeUp,
        }
    }
}

/// `(key, action-kind, payload, proposer-id, attempt-count)`, as carried by an in-flight
/// proposal in the Sync Resolver.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct UnresolvedAction {
    pub payload: ActionPayload,
    pub proposer: HolderId,
    pub attempt_count: u32,
}

/// Side effect emitted alongside a resolved action's mutation (e.g. holder-side deletes on a
/// `Delete` that drains `ref_count` to zero).
#[derive(Clone, Debug)]
pub enum PostHook {
    IssueHolderDeletes,
}

/// Applies `payload` to a (possibly absent) Entry, returning the new entry state (or `None` if
/// the entry is destroyed) plus any post-hook side effect. Total: every combination of payload
/// and entry presence has a defined outcome (spec §4.2). Idempotent under replay of the same
/// resolved action, since applying `Put`/`AddHolder`/etc a second time with the already-recorded
/// state yields the same entry (insertion into a set, or a ref bump that the resolver's
/// at-most-once guarantee prevents from re-firing).
pub fn apply(
    entry: Option<MetadataEntry>,
    payload: &ActionPayload,
) -> Result<(Option<MetadataEntry>, Option<PostHook>)> {
    match payload {
        ActionPayload::Put { type_tag } => match entry {
            None => Ok((Some(MetadataEntry::new_with_size(0)), None)),
            Some(mut e) => {
                if type_tag.is_unique_on_network() {
                    return Err(Error::UniqueDataClash);
                }
                e.ref_count += 1;
                Ok((Some(e), None))
            }
        },
        ActionPayload::AddHolder { holder, size } => match entry {
            None => {
                let mut e = MetadataEntry::new_with_size(*size);
                let _ = e.online_holders.insert(*holder);
                Ok((Some(e), None))
            }
            Some(mut e) => {
                let _ = e.offline_holders.remove(holder);
                let _ = e.online_holders.insert(*holder);
                if e.size == 0 {
                    e.size = *size;
                } else if e.size != *size {
                    return Err(Error::SizeMismatch);
                }
                Ok((Some(e), None))
            }
        },
        ActionPayload::RemoveHolder { holder } => match entry {
            None => Ok((None, None)),
            Some(mut e) => {
                let _ = e.online_holders.remove(holder);
                let _ = e.offline_holders.remove(holder);
                if e.is_empty_of_holders() && e.ref_count == 0 {
                    Ok((None, None))
                } else {
                    Ok((Some(e), None))
                }
            }
        },
        ActionPayload::Delete => match entry {
            None => Ok((None, None)),
            Some(mut e) => {
                e.ref_count = e.ref_count.saturating_sub(1);
                if e.ref_count == 0 {
                    Ok((None, Some(PostHook::IssueHolderDeletes)))
                } else {
                    Ok((Some(e), None))
                }
            }
        },
        ActionPayload::NodeDown { holder } => match entry {
            None => Ok((None, None)),
            Some(mut e) => {
                if e.online_holders.remove(holder) {
                    let _ = e.offline_holders.insert(*holder);
                }
                Ok((Some(e), None))
            }
        },
        ActionPayload::NodeUp { holder } => match entry {
            None => Ok((None, None)),
            Some(mut e) => {
                if e.offline_holders.remove(holder) {
                    let _ = e.online_holders.insert(*holder);
                }
                Ok((Some(e), None))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::XorName;

    fn holder(byte: u8) -> HolderId {
        XorName([byte; 32])
    }

    #[test]
    fn put_on_absent_creates_entry_with_ref_one() {
        let (entry, hook) = apply(None, &ActionPayload::Put { type_tag: TypeTag::ImmutableChunk })
            .unwrap();
        let entry = entry.unwrap();
        assert_eq!(entry.ref_count, 1);
        assert!(entry.is_empty_of_holders());
        assert!(hook.is_none());
    }

    #[test]
    fn replaying_resolved_put_twice_increments_ref_count_exactly_once_per_application() {
        let (entry, _) = apply(None, &ActionPayload::Put { type_tag: TypeTag::ImmutableChunk }).unwrap();
        let (entry, _) = apply(entry, &ActionPayload::Put { type_tag: TypeTag::ImmutableChunk }).unwrap();
        assert_eq!(entry.unwrap().ref_count, 2);
    }

    #[test]
    fn add_holder_on_absent_creates_entry() {
        let (entry, _) = apply(
            None,
            &ActionPayload::AddHolder { holder: holder(1), size: 1024 },
        )
        .unwrap();
        let entry = entry.unwrap();
        assert_eq!(entry.size, 1024);
        assert!(entry.online_holders.contains(&holder(1)));
    }

    #[test]
    fn put_of_unique_on_network_type_against_existing_entry_is_a_clash() {
        let (entry, _) = apply(None, &ActionPayload::Put { type_tag: TypeTag::MutableBlock }).unwrap();
        let result = apply(entry, &ActionPayload::Put { type_tag: TypeTag::MutableBlock });
        assert!(matches!(result, Err(Error::UniqueDataClash)));
    }

    #[test]
    fn add_holder_size_mismatch_is_rejected() {
        let (entry, _) = apply(
            None,
            &ActionPayload::AddHolder { holder: holder(1), size: 1024 },
        )
        .unwrap();
        let result = apply(entry, &ActionPayload::AddHolder { holder: holder(2), size: 2048 });
        assert!(matches!(result, Err(Error::SizeMismatch)));
    }

    #[test]
    fn remove_holder_deletes_entry_when_last_reference_gone() {
        let mut entry = MetadataEntry::new_with_size(10);
        entry.ref_count = 0;
        let _ = entry.online_holders.insert(holder(1));
        let (entry, _) = apply(Some(entry), &ActionPayload::RemoveHolder { holder: holder(1) }).unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn delete_draining_ref_count_emits_holder_delete_posthook() {
        let mut entry = MetadataEntry::new_with_size(10);
        entry.ref_count = 1;
        let (entry, hook) = apply(Some(entry), &ActionPayload::Delete).unwrap();
        assert!(entry.is_none());
        assert!(matches!(hook, Some(PostHook::IssueHolderDeletes)));
    }

    #[test]
    fn node_down_then_up_round_trips_holder_between_partitions() {
        let mut entry = MetadataEntry::new_with_size(10);
        let _ = entry.online_holders.insert(holder(1));
        let (entry, _) = apply(Some(entry), &ActionPayload::NodeDown { holder: holder(1) }).unwrap();
        let entry = entry.unwrap();
        assert!(entry.offline_holders.contains(&holder(1)));
        let (entry, _) = apply(Some(entry), &ActionPayload::NodeUp { holder: holder(1) }).unwrap();
        let entry = entry.unwrap();
        assert!(entry.online_holders.contains(&holder(1)));
        assert!(entry.offline_holders.is_empty());
    }

    #[test]
    fn applying_resolved_action_twice_matches_applying_once() {
        let base = MetadataEntry::new_with_size(10);
        let payload = ActionPayload::AddHolder { holder: holder(3), size: 10 };
        let (once, _) = apply(Some(base.clone()), &payload).unwrap();
        let (twice, _) = apply(once.clone(), &payload).unwrap();
        assert_eq!(once.unwrap().online_holders, twice.unwrap().online_holders);
    }
}
