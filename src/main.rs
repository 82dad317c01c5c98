// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Process entry point: parses the CLI config, wires up a routing oracle and action sink, and
//! runs the vault's event loop until shutdown. The overlay transport and wire codec are external
//! collaborators (spec §1) that this binary does not implement; in their absence, outbound
//! `Action`s are logged rather than actually sent, and the routing oracle is a single-node mock.

use log::{info, warn};
use meshvault::config::Config;
use meshvault::data_manager::dispatcher::Dispatcher;
use meshvault::routing::mock::MockRoutingOracle;
use meshvault::routing::XorName;
use meshvault::vault::{Command, Vault};
use meshvault::Action;
use rand::Rng;
use std::sync::mpsc;
use std::sync::Arc;
use structopt::StructOpt;

fn main() {
    let config = Config::from_args();

    flexi_logger::Logger::with_str("info")
        .start()
        .expect("failed to initialize logging");

    if let Err(error) = run(config) {
        warn!("vault exited with an error: {}", error);
        std::process::exit(1);
    }
}

fn run(config: Config) -> meshvault::Result<()> {
    let root_dir = config.root_dir()?;
    std::fs::create_dir_all(&root_dir)?;

    let my_id = XorName(rand::thread_rng().gen());
    info!("Starting vault {:?} in {:?}", my_id, root_dir);

    let routing = Arc::new(MockRoutingOracle::new(
        my_id,
        config.replication_factor,
        config.replication_factor,
    ));

    let (action_sender, action_receiver) = mpsc::channel::<Action>();
    std::thread::spawn(move || {
        for action in action_receiver {
            info!("dispatching (no transport configured): {:?}", action);
        }
    });
    let dispatcher = Dispatcher::new(Box::new(action_sender));

    let (_event_sender, event_receiver) = crossbeam_channel::unbounded();
    let (command_sender, command_receiver) = crossbeam_channel::unbounded();

    ctrlc::set_handler(move || {
        let _ = command_sender.send(Command::Shutdown);
    })
    .expect("failed to install Ctrl-C handler");

    let mut vault = Vault::new(config, routing, event_receiver, command_receiver, dispatcher)?;
    vault.run();
    info!("vault shut down cleanly");
    Ok(())
}
