//! Remote store: a synchronous adapter for an external caching service.
//!
//! The wire protocol is minimal request/response: each message is a 4-byte
//! big-endian length prefix followed by a bincode payload, one response per
//! request, over a single TCP connection. Values cross the wire in the same
//! tagged JSON text the file backend persists, so the remote backend
//! enforces identical value restrictions.
//!
//! [`serve_connection`] is the answering half of the protocol, so a
//! conforming service (or an in-process test double) can be stood up over
//! any other [`KeyValueStore`] backend.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use stash_value::Value;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::keys::validate_key;
use crate::traits::KeyValueStore;

/// Backend name reported in value-restriction errors.
const BACKEND: &str = "remote";

/// Frames larger than this are rejected as a protocol violation.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// One store operation, as sent to the service.
///
/// Values are carried as codec-encoded JSON text rather than raw bytes, so
/// both ends agree on the representable kinds.
#[derive(Debug, Serialize, Deserialize)]
pub enum Request {
    /// Map `key` to the encoded value.
    Set { key: String, value: String },
    /// Read the value stored under `key`.
    Get { key: String },
    /// Report whether `key` is present.
    Contains { key: String },
    /// Remove `key` if present.
    Remove { key: String },
    /// Remove every key.
    Clear,
}

/// The service's answer to one [`Request`].
#[derive(Debug, Serialize, Deserialize)]
pub enum Response {
    /// The mutation completed.
    Done,
    /// The encoded value under the requested key, if present.
    Entry(Option<String>),
    /// Whether the requested key is present.
    Presence(bool),
    /// Whether the removed key had been present.
    Removed(bool),
    /// The service could not complete the request.
    Failed(String),
}

/// Write one length-prefixed frame.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()
}

/// Read one length-prefixed frame, enforcing [`MAX_FRAME_SIZE`].
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header)?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte limit"),
        ));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Synchronous client for a caching service speaking the stash protocol.
///
/// All operations block on one underlying connection; a connection-level
/// failure surfaces as a store-level `Read`/`Write` error, never a retry.
pub struct RemoteStore {
    addr: String,
    conn: Mutex<TcpStream>,
}

impl RemoteStore {
    /// Connect to the service at `addr` (`host:port`).
    ///
    /// A refused or unreachable address is reported as `Unavailable`, so
    /// the caller can treat the backend as absent instead of failing every
    /// subsequent call.
    pub fn connect(addr: impl Into<String>) -> StoreResult<Self> {
        let addr = addr.into();
        let conn = TcpStream::connect(&addr).map_err(|e| StoreError::Unavailable {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
        debug!(%addr, "connected to remote store");
        Ok(Self {
            addr,
            conn: Mutex::new(conn),
        })
    }

    /// Address this store was connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn round_trip(&self, request: &Request) -> StoreResult<Response> {
        let payload =
            bincode::serialize(request).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut conn = self.conn.lock().expect("lock poisoned");
        write_frame(&mut *conn, &payload)
            .map_err(|e| StoreError::Write(format!("{}: {e}", self.addr)))?;
        let answer = read_frame(&mut *conn)
            .map_err(|e| StoreError::Read(format!("{}: {e}", self.addr)))?;
        bincode::deserialize(&answer)
            .map_err(|e| StoreError::Read(format!("malformed response from {}: {e}", self.addr)))
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore").field("addr", &self.addr).finish()
    }
}

fn unexpected(response: Response) -> StoreError {
    StoreError::Read(format!("unexpected response: {response:?}"))
}

impl KeyValueStore for RemoteStore {
    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        validate_key(key)?;
        let raw = codec::encode_value(&value, BACKEND)?;
        let text =
            serde_json::to_string(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
        match self.round_trip(&Request::Set {
            key: key.to_string(),
            value: text,
        })? {
            Response::Done => Ok(()),
            Response::Failed(reason) => Err(StoreError::Write(reason)),
            other => Err(unexpected(other)),
        }
    }

    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        validate_key(key)?;
        match self.round_trip(&Request::Get {
            key: key.to_string(),
        })? {
            Response::Entry(None) => Ok(None),
            Response::Entry(Some(text)) => {
                let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                    StoreError::Read(format!("malformed entry from {}: {e}", self.addr))
                })?;
                codec::decode_value(&raw).map(Some)
            }
            Response::Failed(reason) => Err(StoreError::Read(reason)),
            other => Err(unexpected(other)),
        }
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        match self.round_trip(&Request::Contains {
            key: key.to_string(),
        })? {
            Response::Presence(present) => Ok(present),
            Response::Failed(reason) => Err(StoreError::Read(reason)),
            other => Err(unexpected(other)),
        }
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        match self.round_trip(&Request::Remove {
            key: key.to_string(),
        })? {
            Response::Removed(was_present) => Ok(was_present),
            Response::Failed(reason) => Err(StoreError::Write(reason)),
            other => Err(unexpected(other)),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        match self.round_trip(&Request::Clear)? {
            Response::Done => Ok(()),
            Response::Failed(reason) => Err(StoreError::Write(reason)),
            other => Err(unexpected(other)),
        }
    }
}

/// Serve one client connection against `store`, answering requests until
/// the peer disconnects.
pub fn serve_connection(stream: TcpStream, store: &dyn KeyValueStore) -> io::Result<()> {
    let mut conn = stream;
    loop {
        let payload = match read_frame(&mut conn) {
            Ok(payload) => payload,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = match bincode::deserialize::<Request>(&payload) {
            Ok(request) => handle(&request, store),
            Err(e) => Response::Failed(format!("malformed request: {e}")),
        };
        let answer = bincode::serialize(&response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_frame(&mut conn, &answer)?;
    }
}

fn handle(request: &Request, store: &dyn KeyValueStore) -> Response {
    match request {
        Request::Set { key, value } => {
            let raw: serde_json::Value = match serde_json::from_str(value) {
                Ok(raw) => raw,
                Err(e) => return Response::Failed(format!("malformed entry: {e}")),
            };
            let decoded = match codec::decode_value(&raw) {
                Ok(decoded) => decoded,
                Err(e) => return Response::Failed(e.to_string()),
            };
            match store.set(key, decoded) {
                Ok(()) => Response::Done,
                Err(e) => Response::Failed(e.to_string()),
            }
        }
        Request::Get { key } => match store.get(key) {
            Ok(None) => Response::Entry(None),
            Ok(Some(value)) => {
                let encoded = codec::encode_value(&value, BACKEND).and_then(|raw| {
                    serde_json::to_string(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
                });
                match encoded {
                    Ok(text) => Response::Entry(Some(text)),
                    Err(e) => Response::Failed(e.to_string()),
                }
            }
            Err(e) => Response::Failed(e.to_string()),
        },
        Request::Contains { key } => match store.contains(key) {
            Ok(present) => Response::Presence(present),
            Err(e) => Response::Failed(e.to_string()),
        },
        Request::Remove { key } => match store.remove(key) {
            Ok(was_present) => Response::Removed(was_present),
            Err(e) => Response::Failed(e.to_string()),
        },
        Request::Clear => match store.clear() {
            Ok(()) => Response::Done,
            Err(e) => Response::Failed(e.to_string()),
        },
    }
}
