// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! C2: the keyed persistent map from `(data-id, type-tag)` to Metadata Entry. Grounded directly
//! on the teacher's `idata_handler::IDataHandler` (`metadata: PickleDb` plus `utils::new_db`);
//! generalized here into its own single-writer-per-key component rather than inline PickleDb
//! calls scattered through the handler.

use crate::data_manager::entry::MetadataEntry;
use crate::error::{Error, Result};
use crate::rpc::DataKey;
use crate::utils::ToDbKey;
use crate::vault::Init;
use log::trace;
use pickledb::{PickleDb, PickleDbDumpPolicy};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const METADATA_DB_NAME: &str = "data_manager_metadata.db";

/// Keyed persistent map. A `Mutex` around the whole `PickleDb` gives the "concurrent `mutate`
/// calls on the same key are serialized" guarantee of spec §4.1; since PickleDb itself has no
/// per-key locking, serializing all access is the simplest implementation that honors the
/// contract (no two keys are ever mutated concurrently with PickleDb as the backing store
/// either, so this does not regress real concurrency for the in-process single-writer case the
/// teacher assumes).
pub struct MetadataStore {
    db: Mutex<PickleDb>,
}

impl MetadataStore {
    pub fn new<D: AsRef<Path>>(root_dir: D, init_mode: Init) -> Result<Self> {
        Ok(Self {
            db: Mutex::new(new_db(root_dir, METADATA_DB_NAME, init_mode)?),
        })
    }

    pub fn get(&self, key: &DataKey) -> Result<MetadataEntry> {
        let db = self.db.lock().expect("metadata store lock poisoned");
        db.get::<MetadataEntry>(&key.to_db_key())
            .ok_or(Error::NotFound)
    }

    pub fn put(&self, key: &DataKey, entry: &MetadataEntry) -> Result<()> {
        let mut db = self.db.lock().expect("metadata store lock poisoned");
        db.set(&key.to_db_key(), entry)
            .map_err(|err| Error::Db(err.to_string()))
    }

    pub fn delete(&self, key: &DataKey) -> Result<()> {
        let mut db = self.db.lock().expect("metadata store lock poisoned");
        let _ = db
            .rem(&key.to_db_key())
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(())
    }

    pub fn exists(&self, key: &DataKey) -> bool {
        let db = self.db.lock().expect("metadata store lock poisoned");
        db.exists(&key.to_db_key())
    }

    /// Serializes a read-modify-write against `key`: the sole form of mutation the store
    /// exposes, so that "single-writer semantics" (spec §4.1) cannot be bypassed by a caller
    /// doing separate get/put calls.
    pub fn mutate<F>(&self, key: &DataKey, f: F) -> Result<Option<MetadataEntry>>
    where
        F: FnOnce(Option<MetadataEntry>) -> Result<Option<MetadataEntry>>,
    {
        let mut db = self.db.lock().expect("metadata store lock poisoned");
        let db_key = key.to_db_key();
        let current = db.get::<MetadataEntry>(&db_key);
        let next = f(current)?;
        match &next {
            Some(entry) => {
                db.set(&db_key, entry)
                    .map_err(|err| Error::Db(err.to_string()))?;
            }
            None => {
                if db.exists(&db_key) {
                    let _ = db
                        .rem(&db_key)
                        .map_err(|err| Error::Db(err.to_string()))?;
                }
            }
        }
        Ok(next)
    }

    /// Iterates every key this node currently holds metadata for, used by the Churn Handler and
    /// account transfer.
    pub fn keys(&self) -> Vec<DataKey> {
        let db = self.db.lock().expect("metadata store lock poisoned");
        db.iter()
            .map(|kv| crate::utils::db_key_to_data_key(kv.get_key()))
            .collect()
    }
}

fn new_db<D: AsRef<Path>, N: AsRef<Path>>(
    db_dir: D,
    db_name: N,
    init_mode: Init,
) -> Result<PickleDb> {
    let db_path = db_dir.as_ref().join(db_name);
    if init_mode == Init::New {
        trace!("Creating database at {}", db_path.display());
        fs::create_dir_all(&db_dir)?;
        let mut db = PickleDb::new_bin(db_path, PickleDbDumpPolicy::AutoDump);
        db.set("", &"").map_err(|err| Error::Db(err.to_string()))?;
        let _ = db.rem("").map_err(|err| Error::Db(err.to_string()))?;
        return Ok(db);
    }
    trace!("Loading database at {}", db_path.display());
    PickleDb::load_bin(db_path, PickleDbDumpPolicy::AutoDump)
        .map_err(|err| Error::Db(err.to_string()))
}
