// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The per-process shell, generalized from the teacher's `vault.rs`: the same
//! `crossbeam_channel::Select` event loop, but wrapping a single `data_manager::Service` instead
//! of a `ClientHandler`/`DataHandler` pair behind `State::{Elder, Adult}` (the wire transport and
//! persona-dispatch demultiplexer this used to sit on top of are external collaborators, spec §1).

use crate::data_manager::dispatcher::Dispatcher;
use crate::data_manager::Service;
use crate::routing::{HolderId, RoutingOracle};
use crate::rpc::Event;
use crate::{utils, Config, Result};
use crossbeam_channel::{Receiver, Select};
use log::{error, info, trace};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const STATE_FILENAME: &str = "state";

/// Specifies whether to try loading cached data from disk, or to just construct a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    Load,
    New,
}

/// Command that the user can send to a running vault to control its execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Shutdown the vault.
    Shutdown,
}

/// Main vault struct: one `data_manager::Service` fed by an inbound event channel, a command
/// channel, and a periodic tick that drives Sync Resolver retransmission and Get Operation
/// deadline polling (spec §4.3, §4.8).
pub struct Vault {
    id: HolderId,
    root_dir: PathBuf,
    service: Service,
    event_receiver: Receiver<Event>,
    command_receiver: Receiver<Command>,
    tick_receiver: Receiver<std::time::Instant>,
}

impl Vault {
    /// Creates the vault, loading persisted state if present. This does not start the event
    /// loop; call `run` or `poll` for that.
    pub fn new(
        config: Config,
        routing: Arc<dyn RoutingOracle>,
        event_receiver: Receiver<Event>,
        command_receiver: Receiver<Command>,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        let id = routing.my_id();
        let root_dir = config.root_dir()?;

        let init_mode = match Self::read_state(&config)? {
            Some(saved_id) if saved_id == id => Init::Load,
            _ => Init::New,
        };
        if init_mode == Init::New {
            info!("Initializing new vault state for {:?}", id);
        }

        let service = Service::new(&root_dir, init_mode, config, routing, dispatcher)?;
        let tick_receiver = crossbeam_channel::tick(Duration::from_millis(500));

        let vault = Self {
            id,
            root_dir,
            service,
            event_receiver,
            command_receiver,
            tick_receiver,
        };
        vault.dump_state()?;
        Ok(vault)
    }

    /// Runs the main event loop. Blocks until `Command::Shutdown` is received or a channel
    /// disconnects.
    pub fn run(&mut self) {
        loop {
            if !self.step() {
                break;
            }
        }
    }

    /// Processes at most one outstanding event and returns. Does not block. Returns whether an
    /// event was processed.
    pub fn poll(&mut self) -> bool {
        let mut sel = Select::new();
        let event_idx = sel.recv(&self.event_receiver);
        let command_idx = sel.recv(&self.command_receiver);
        let tick_idx = sel.recv(&self.tick_receiver);

        match sel.try_ready() {
            Ok(idx) => self.handle_selected(idx, event_idx, command_idx, tick_idx),
            Err(_) => false,
        }
    }

    /// Blocks for the next event/command/tick and processes it. Returns `false` on shutdown or
    /// channel disconnection, signalling `run`'s loop to stop.
    fn step(&mut self) -> bool {
        let mut sel = Select::new();
        let event_idx = sel.recv(&self.event_receiver);
        let command_idx = sel.recv(&self.command_receiver);
        let tick_idx = sel.recv(&self.tick_receiver);

        let idx = sel.ready();
        self.handle_selected(idx, event_idx, command_idx, tick_idx)
    }

    fn handle_selected(&mut self, idx: usize, event_idx: usize, command_idx: usize, tick_idx: usize) -> bool {
        if idx == command_idx {
            match self.command_receiver.recv() {
                Ok(Command::Shutdown) => false,
                Err(_) => {
                    info!("{}: command channel disconnected, shutting down", self);
                    false
                }
            }
        } else if idx == event_idx {
            match self.event_receiver.recv() {
                Ok(event) => {
                    trace!("{} handling event {:?}", self, event);
                    self.service.handle_event(event);
                    true
                }
                Err(_) => {
                    error!("{}: event channel disconnected, shutting down", self);
                    false
                }
            }
        } else if idx == tick_idx {
            let _ = self.tick_receiver.recv();
            self.service.retransmit_due();
            self.service.poll_expired_gets();
            true
        } else {
            unreachable!("Select only ever registers the three receivers above")
        }
    }

    fn dump_state(&self) -> Result<()> {
        let path = self.root_dir.join(STATE_FILENAME);
        fs::write(path, utils::serialise(&self.id))?;
        Ok(())
    }

    /// Returns the persisted node identity, or `None` if no state file exists yet.
    fn read_state(config: &Config) -> Result<Option<HolderId>> {
        let path = config.root_dir()?.join(STATE_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read(path)?;
        Ok(Some(bincode::deserialize(&contents)?))
    }
}

impl std::fmt::Display for Vault {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "Vault({:?})", self.id)
    }
}
