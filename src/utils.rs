// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::rpc::DataKey;
use rand::{distributions::Standard, CryptoRng, Rng};
use serde::Serialize;
use unwrap::unwrap;

pub(crate) fn random_vec<R: CryptoRng + Rng>(rng: &mut R, size: usize) -> Vec<u8> {
    rng.sample_iter(&Standard).take(size).collect()
}

pub(crate) fn serialise<T: Serialize>(data: &T) -> Vec<u8> {
    unwrap!(bincode::serialize(data))
}

/// Encodes a Metadata Store key as the base64 string PickleDb expects, matching the teacher's
/// `IDataAddress::to_db_key` / `utils::db_key_to_idata_address` pair.
pub(crate) trait ToDbKey {
    fn to_db_key(&self) -> String;
}

impl ToDbKey for DataKey {
    fn to_db_key(&self) -> String {
        base64::encode(serialise(self))
    }
}

pub(crate) fn db_key_to_data_key(encoded: &str) -> DataKey {
    let decoded = unwrap!(base64::decode(encoded));
    unwrap!(bincode::deserialize::<DataKey>(&decoded))
}
