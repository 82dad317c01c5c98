// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Sender-role validation (§9 open question (c)): checks that the role claimed for an inbound
//! message matches the role legitimately allowed to produce that kind of event, generalizing
//! `ValidateSender` from `original_source/data_manager/service.h`. The wire demultiplexer (an
//! external collaborator, spec §1) is what would supply a `SenderRole` from the message's signed
//! envelope; `Service::accept_sender` stays permissive unless `Config::enforce_sender_role` is
//! set, matching the original's stubbed-permissive default.

use crate::rpc::Event;

/// The role a peer claims to hold when it sends a message into the Data Manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRole {
    /// The client or application that owns the data.
    Origin,
    /// A node storing a replica of the data.
    StorageHolder,
    /// A peer within this Data Manager group, or a churn source.
    DataManagerPeer,
    /// The cache persona returning a previously cached Get result.
    Cache,
}

fn expected_role(event: &Event) -> SenderRole {
    match event {
        Event::PutRequestFromOrigin { .. }
        | Event::GetRequestFromClient { .. }
        | Event::DeleteRequestFromOrigin { .. } => SenderRole::Origin,
        Event::PutResponseFromStorageGroup { .. }
        | Event::PutFailureFromStorageGroup { .. }
        | Event::GetResponseFromHolder { .. } => SenderRole::StorageHolder,
        Event::GetCachedResponseFromCache { .. } => SenderRole::Cache,
        Event::GetRequestFromAuxiliary { .. }
        | Event::SynchroniseFromPeer { .. }
        | Event::AccountTransferFromPeer { .. }
        | Event::SetHolderOnline { .. }
        | Event::SetHolderOffline { .. }
        | Event::RoutingMatrixChanged => SenderRole::DataManagerPeer,
    }
}

/// Returns whether `claimed_role` is the role legitimately allowed to produce `event`.
pub fn validate_sender(event: &Event, claimed_role: SenderRole) -> bool {
    claimed_role == expected_role(event)
}
