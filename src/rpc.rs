// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The wire codec and persona-dispatch demultiplexer are external collaborators (spec §1); this
//! module defines only the shapes the Data Manager needs once a message has already been
//! demultiplexed to it, generalizing the teacher's `rpc::Rpc`.

use crate::data_manager::action_log::ActionKind;
use crate::data_manager::entry::TypeTag;
use crate::error::Error;
use crate::routing::{DataId, HolderId};
use serde::{Deserialize, Serialize};

/// Correlates a request with its eventual response(s), as the teacher's `MessageId` does.
pub type MessageId = u64;

/// Key into the Metadata Store: `(data-id, type-tag)` per spec §3.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
pub struct DataKey {
    pub data_id: DataId,
    pub type_tag: TypeTag,
}

impl DataKey {
    pub fn new(data_id: DataId, type_tag: TypeTag) -> Self {
        Self { data_id, type_tag }
    }
}

/// A random-nonce keyed-hash challenge posed to a holder (§4.6).
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
pub struct IntegrityCheck {
    pub nonce: [u8; 32],
}

/// The full inbound event taxonomy of §6, as delivered by the (external) demultiplexer.
#[derive(Clone, Debug)]
pub enum Event {
    PutRequestFromOrigin {
        requester: HolderId,
        key: DataKey,
        data: Vec<u8>,
        message_id: MessageId,
    },
    PutResponseFromStorageGroup {
        holder: HolderId,
        key: DataKey,
        message_id: MessageId,
        size: u64,
    },
    PutFailureFromStorageGroup {
        holder: HolderId,
        key: DataKey,
        message_id: MessageId,
        error: Error,
    },
    GetRequestFromClient {
        requester: HolderId,
        key: DataKey,
        message_id: MessageId,
    },
    GetRequestFromAuxiliary {
        requester: HolderId,
        key: DataKey,
        message_id: MessageId,
    },
    GetResponseFromHolder {
        holder: HolderId,
        message_id: MessageId,
        content: Option<Vec<u8>>,
    },
    GetCachedResponseFromCache {
        message_id: MessageId,
        content: Option<Vec<u8>>,
    },
    DeleteRequestFromOrigin {
        requester: HolderId,
        key: DataKey,
        message_id: MessageId,
    },
    SynchroniseFromPeer {
        proposer: HolderId,
        key: DataKey,
        kind: ActionKind,
        payload: Vec<u8>,
    },
    AccountTransferFromPeer {
        entries: Vec<(DataKey, Vec<u8>)>,
    },
    SetHolderOnline {
        key: DataKey,
        holder: HolderId,
    },
    SetHolderOffline {
        key: DataKey,
        holder: HolderId,
    },
    RoutingMatrixChanged,
}

/// Request/response envelope exchanged with holder nodes and peer Data Managers.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum Rpc {
    PutRequest {
        key: DataKey,
        data: Vec<u8>,
        message_id: MessageId,
    },
    GetRequest {
        key: DataKey,
        message_id: MessageId,
    },
    IntegrityCheckRequest {
        key: DataKey,
        message_id: MessageId,
        check: IntegrityCheck,
    },
    DeleteRequest {
        key: DataKey,
        message_id: MessageId,
    },
    FalseDataNotification {
        key: DataKey,
        message_id: MessageId,
    },
    Sync {
        key: DataKey,
        kind: ActionKind,
        payload: Vec<u8>,
        proposer: HolderId,
        attempt: u32,
    },
}
