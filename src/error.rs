// Copyright 2019 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use quick_error::quick_error;
use std::io;

quick_error! {
    /// Crate-wide error type. Variants correspond to the semantic error kinds of §7: recoverable
    /// errors are localized to the affected operation rather than propagated to the process.
    #[derive(Debug)]
    pub enum Error {
        /// Key absent from the Metadata Store.
        NotFound {
            display("key not found in metadata store")
        }
        /// Put of a unique-on-network datum whose key already exists.
        UniqueDataClash {
            display("data already exists and is unique-on-network")
        }
        /// A challenge response disagreed with the reference hash.
        IntegrityFailure {
            display("integrity check failed: holder returned a mismatched result")
        }
        /// Expected response did not arrive before the deadline.
        HolderTimeout {
            display("holder did not respond before the deadline")
        }
        /// Persistent metadata store decode failure.
        StoreCorrupt(message: String) {
            display("metadata store entry is corrupt: {}", message)
        }
        /// Dispatcher send failed.
        TransportError(message: String) {
            display("transport send failed: {}", message)
        }
        /// A Put conflicted on `size` with an existing entry.
        SizeMismatch {
            display("put size does not match the entry's recorded size")
        }
        /// The requester is not the entry's owner.
        AccessDenied {
            display("requester is not authorised for this key")
        }
        /// Sender's role is incompatible with the message's payload type.
        InvalidSender {
            display("sender role does not match payload type")
        }
        Io(err: io::Error) {
            display("I/O error: {}", err)
            from()
        }
        Bincode(err: Box<bincode::ErrorKind>) {
            display("serialization error: {}", err)
            from()
        }
        Db(message: String) {
            display("metadata store error: {}", message)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<pickledb::error::Error> for Error {
    fn from(err: pickledb::error::Error) -> Self {
        Error::Db(err.to_string())
    }
}
