// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The Data Manager persona: metadata storage, replica placement, integrity-checked reads,
//! quorum-based synchronisation, and churn handling (spec §1-§5), replacing the teacher's
//! `data_handler` module.

pub mod action_log;
pub mod churn;
pub mod dispatcher;
pub mod entry;
pub mod get_op;
pub mod placement;
pub mod store;
pub mod sync_resolver;
pub mod validate;

mod service;

pub use service::Service;
