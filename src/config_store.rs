// config_store.rs - Like Channel Allow-List Persistence
// Keeps the per-server list of channels where the like command may be used,
// backed by a single pretty-printed JSON file.
//
// Key Features:
// - Unreadable or non-object files are replaced by an empty default document
// - Bad entries inside an otherwise valid document are skipped, not fatal
// - Saves go through a temp file and a rename, so the file on disk is always complete
// - Unknown keys in the document are carried through load/save untouched
//
// Used by: main.rs (startup), commands/setlikechannel.rs, commands/like.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize like channel config: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// Per-server settings, keyed by server id in `ConfigDocument::servers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub like_channels: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// On-disk shape: `{"servers": {"<id>": {"like_channels": ["<id>", ...]}}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    document: ConfigDocument,
}

impl ConfigStore {
    /// Load the document at `path`.
    /// A missing file, or one that is not a JSON object, is reset to the
    /// default and the default is written back immediately. Malformed entries
    /// inside a valid document are dropped with a warning; the rest is kept.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let parsed = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(root)) => Some(decode_document(root)),
                Ok(_) => {
                    warn!("⚠️ Config file '{}' is not a JSON object, resetting", path.display());
                    None
                }
                Err(e) => {
                    warn!("⚠️ Corrupt config file '{}', resetting: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let store = match parsed {
            Some(document) => ConfigStore { path, document },
            None => {
                let store = ConfigStore {
                    path,
                    document: ConfigDocument::default(),
                };
                store.save()?;
                info!("📝 Initialized empty like channel config at {}", store.path.display());
                store
            }
        };

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Persist the current document: write `<file>.tmp` next to the target,
    /// flush it to disk, then rename it over the target.
    pub fn save(&self) -> Result<(), StoreError> {
        write_atomically(&self.path, &self.document)
    }

    /// Direct messages are always allowed. In a server, an empty or absent
    /// allow-list means unrestricted.
    pub fn is_channel_allowed(&self, server_id: Option<u64>, channel_id: u64) -> bool {
        let server_id = match server_id {
            Some(id) => id,
            None => return true,
        };

        match self.document.servers.get(&server_id.to_string()) {
            Some(server) => {
                server.like_channels.is_empty()
                    || server.like_channels.contains(&channel_id.to_string())
            }
            None => true,
        }
    }

    /// Flip the channel's membership in the server's allow-list.
    /// Returns `true` when the channel was added, `false` when it was removed.
    /// The caller is expected to `save()` right after.
    pub fn toggle_channel(&mut self, server_id: u64, channel_id: u64) -> bool {
        let channel_id = channel_id.to_string();
        let like_channels = &mut self
            .document
            .servers
            .entry(server_id.to_string())
            .or_default()
            .like_channels;

        if like_channels.contains(&channel_id) {
            like_channels.retain(|existing| existing != &channel_id);
            false
        } else {
            like_channels.push(channel_id);
            true
        }
    }
}

// ============================================================================
// LENIENT DECODING
// ============================================================================

fn decode_document(mut root: Map<String, Value>) -> ConfigDocument {
    let servers = match root.remove("servers") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(servers)) => servers
            .into_iter()
            .filter_map(|(server_id, value)| match value {
                Value::Object(server) => Some((server_id.clone(), decode_server(&server_id, server))),
                other => {
                    warn!("⚠️ Skipping server '{}': expected an object, got {}", server_id, other);
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!("⚠️ Ignoring 'servers': expected an object, got {}", other);
            BTreeMap::new()
        }
    };

    ConfigDocument { servers, extra: root }
}

fn decode_server(server_id: &str, mut server: Map<String, Value>) -> ServerConfig {
    let like_channels = match server.remove("like_channels") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(id),
                // Ids written as bare numbers still name a channel
                Value::Number(id) if id.is_u64() => Some(id.to_string()),
                other => {
                    warn!("⚠️ Skipping like channel {} of server '{}'", other, server_id);
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!("⚠️ Ignoring like_channels of server '{}': expected a list, got {}", server_id, other);
            Vec::new()
        }
    };

    let mut deduped: Vec<String> = Vec::with_capacity(like_channels.len());
    for id in like_channels {
        if !deduped.contains(&id) {
            deduped.push(id);
        }
    }

    ServerConfig {
        like_channels: deduped,
        extra: server,
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_atomically(path: &Path, document: &ConfigDocument) -> Result<(), StoreError> {
    // Four-space indentation
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document.serialize(&mut serializer)?;

    let temp_path = temp_path_for(path);
    let io_err = |source: std::io::Error| StoreError::Io {
        path: temp_path.clone(),
        source,
    };

    let mut file = File::create(&temp_path).map_err(io_err)?;
    file.write_all(&buffer).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
