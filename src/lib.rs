// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! A Data Manager node for a content-addressed peer-to-peer storage overlay: metadata
//! management, replica placement, integrity-checked reads, quorum-based synchronisation, and
//! churn handling.

mod action;
pub mod config;
pub mod data_manager;
mod error;
pub mod routing;
pub mod rpc;
mod utils;
pub mod vault;

pub use crate::action::Action;
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::vault::{Command, Init, Vault};
