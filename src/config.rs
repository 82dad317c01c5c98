// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::Result;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

const QUALIFIER: &str = "net";
const ORGANISATION: &str = "vault-contributors";
const APPLICATION: &str = "meshvault";

/// Node configuration, parsed from the CLI and consulted throughout the Data Manager.
#[derive(StructOpt, Debug, Clone)]
#[structopt(name = "meshvault")]
pub struct Config {
    /// Root directory for on-disk state (metadata store). Defaults to the platform data dir.
    #[structopt(long)]
    root_dir: Option<PathBuf>,

    /// Target number of holders per datum, and the size of the Data Manager group.
    #[structopt(long, default_value = "4")]
    pub replication_factor: usize,

    /// Number of agreeing proposals required for the Sync Resolver to resolve an action.
    /// Defaults to `ceil(replication_factor / 2) + 1` when unset.
    #[structopt(long)]
    quorum: Option<usize>,

    /// Upper bound on Sync Resolver retransmission attempts before an unresolved action is
    /// dropped (§9 open question (b)).
    #[structopt(long, default_value = "10")]
    pub retransmit_cap: u32,

    /// Enable the peer-cache fallback path on Get when the content source fails
    /// (§9 open question (a)).
    #[structopt(long)]
    pub enable_peer_cache_fallback: bool,

    /// Disable de-ranking of holders that fail integrity checks (on by default).
    #[structopt(long)]
    pub disable_deranking: bool,

    /// Enforce that a message's source role matches its payload type
    /// (§9 open question (c)); permissive by default.
    #[structopt(long)]
    pub enforce_sender_role: bool,

    /// Deadline, in milliseconds, for a Get Operation to resolve.
    #[structopt(long, default_value = "5000")]
    pub get_deadline_ms: u64,

    /// Upper bound on concurrent in-flight Get Operations per node (spec §5 resource limits).
    #[structopt(long, default_value = "1000")]
    pub max_concurrent_gets: usize,

    /// Upper bound on unresolved proposals tracked per Sync Resolver kind (spec §5 resource
    /// limits) before the oldest is evicted with a logged warning.
    #[structopt(long, default_value = "10000")]
    pub max_unresolved_actions_per_kind: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_iter(&[APPLICATION])
    }
}

impl Config {
    pub fn root_dir(&self) -> Result<PathBuf> {
        match &self.root_dir {
            Some(path) => Ok(path.clone()),
            None => {
                let dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
                    .map(|dirs| dirs.data_dir().to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(dirs)
            }
        }
    }

    pub fn set_root_dir<P: AsRef<Path>>(&mut self, path: P) {
        self.root_dir = Some(path.as_ref().to_path_buf());
    }

    /// Overrides the computed default (§9 open question (b) callers, and single-node tests that
    /// want every proposal to resolve on the first vote).
    pub fn set_quorum(&mut self, quorum: usize) {
        self.quorum = Some(quorum);
    }

    /// The quorum threshold for the Sync Resolver: `⌈replication_factor / 2⌉ + 1` unless
    /// overridden.
    pub fn quorum(&self) -> usize {
        self.quorum
            .unwrap_or_else(|| (self.replication_factor + 1) / 2 + 1)
    }

    pub fn deranking_enabled(&self) -> bool {
        !self.disable_deranking
    }
}
