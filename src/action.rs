// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Outbound dispatch intents the Data Manager hands back to the vault shell. Generalized from
//! the teacher's `action::Action`/`vault.rs::handle_action` match arms: instead of routing
//! through client/data handler pairs, every variant here corresponds directly to one entry in
//! the §4.8 dispatcher facade.

use crate::data_manager::entry::StorageCost;
use crate::routing::HolderId;
use crate::rpc::{IntegrityCheck, MessageId, Rpc};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub enum Action {
    /// Dispatch a Put request to the chosen holder(s).
    SendPutRequest {
        targets: BTreeSet<HolderId>,
        rpc: Rpc,
    },
    /// Acknowledge a Put back to the origin, carrying the storage cost (§4.4).
    SendPutResponse {
        target: HolderId,
        message_id: MessageId,
        cost: Option<StorageCost>,
    },
    SendPutFailure {
        target: HolderId,
        message_id: MessageId,
        error: crate::error::Error,
    },
    SendGetRequest {
        target: HolderId,
        message_id: MessageId,
    },
    SendIntegrityCheck {
        target: HolderId,
        message_id: MessageId,
        check: IntegrityCheck,
    },
    SendGetResponseSuccess {
        target: HolderId,
        message_id: MessageId,
        content: Vec<u8>,
    },
    SendGetResponseFailure {
        target: HolderId,
        message_id: MessageId,
    },
    SendDeleteRequest {
        targets: BTreeSet<HolderId>,
        message_id: MessageId,
    },
    SendFalseDataNotification {
        target: HolderId,
        message_id: MessageId,
    },
    SendPutToCache {
        content: Vec<u8>,
    },
    SendSync {
        targets: BTreeSet<HolderId>,
        rpc: Rpc,
    },
}
