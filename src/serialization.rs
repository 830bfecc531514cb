//! Saving and loading components.
//!
//! Every component derives `Serialize`/`Deserialize`, so the blanket
//! [`Serializable`] trait gives each of them byte, string, reader/writer and
//! file helpers. A restored component holds its full learned state and the
//! exact position of its random stream, so it continues exactly where the
//! saved one left off.
//!
//! # Formats
//!
//! - **Binary**: compact, via bincode
//! - **JSON**: human-readable, via serde_json
//!
//! # Example
//!
//! ```rust
//! use cortical::algorithms::{SpatialPooler, SpatialPoolerParams};
//! use cortical::serialization::{Serializable, SerializableFormat};
//!
//! let sp = SpatialPooler::new(SpatialPoolerParams {
//!     input_dimensions: vec![32],
//!     column_dimensions: vec![64],
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let bytes = sp.to_bytes(SerializableFormat::Binary).unwrap();
//! let restored = SpatialPooler::from_bytes(&bytes, SerializableFormat::Binary).unwrap();
//! assert_eq!(sp, restored);
//! ```

use crate::error::{CorticalError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializableFormat {
    /// bincode. Compact and fast, not human-readable.
    #[default]
    Binary,

    /// Pretty-printed JSON.
    Json,
}

impl SerializableFormat {
    /// Picks a format from a file extension: `.json` is JSON, anything else
    /// is binary. The match is case-sensitive.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Binary,
        }
    }
}

impl std::fmt::Display for SerializableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "BINARY"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

impl std::str::FromStr for SerializableFormat {
    type Err = CorticalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BINARY" | "BIN" => Ok(Self::Binary),
            "JSON" => Ok(Self::Json),
            _ => Err(CorticalError::InvalidParameter {
                name: "format",
                message: format!("Unknown format '{s}'. Expected: BINARY, JSON"),
            }),
        }
    }
}

fn encode_error(format: SerializableFormat, err: impl Display) -> CorticalError {
    CorticalError::SerializationError {
        message: format!("{format} serialization failed: {err}"),
    }
}

fn decode_error(format: SerializableFormat, err: impl Display) -> CorticalError {
    CorticalError::SerializationError {
        message: format!("{format} deserialization failed: {err}"),
    }
}

/// Save/load helpers for every serde-enabled type.
pub trait Serializable: Serialize + DeserializeOwned + Sized {
    /// Serializes to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] if encoding fails.
    fn to_bytes(&self, format: SerializableFormat) -> Result<Vec<u8>> {
        match format {
            SerializableFormat::Binary => bincode::serialize(self).map_err(|e| encode_error(format, e)),
            SerializableFormat::Json => serde_json::to_vec_pretty(self).map_err(|e| encode_error(format, e)),
        }
    }

    /// Deserializes from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] for malformed input.
    fn from_bytes(bytes: &[u8], format: SerializableFormat) -> Result<Self> {
        match format {
            SerializableFormat::Binary => bincode::deserialize(bytes).map_err(|e| decode_error(format, e)),
            SerializableFormat::Json => serde_json::from_slice(bytes).map_err(|e| decode_error(format, e)),
        }
    }

    /// Serializes to a pretty JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] if encoding fails.
    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| encode_error(SerializableFormat::Json, e))
    }

    /// Deserializes from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] for malformed input.
    fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| decode_error(SerializableFormat::Json, e))
    }

    /// Writes to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] if encoding or writing
    /// fails.
    fn save<W: Write>(&self, writer: W, format: SerializableFormat) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        match format {
            SerializableFormat::Binary => {
                bincode::serialize_into(&mut writer, self).map_err(|e| encode_error(format, e))?;
            }
            SerializableFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, self).map_err(|e| encode_error(format, e))?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::SerializationError`] for malformed input.
    fn load<R: Read>(reader: R, format: SerializableFormat) -> Result<Self> {
        let reader = BufReader::new(reader);
        match format {
            SerializableFormat::Binary => bincode::deserialize_from(reader).map_err(|e| decode_error(format, e)),
            SerializableFormat::Json => serde_json::from_reader(reader).map_err(|e| decode_error(format, e)),
        }
    }

    /// Saves to the file at `path`, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IoError`] if the file cannot be created.
    fn save_to_file<P: AsRef<Path>>(&self, path: P, format: SerializableFormat) -> Result<()> {
        let path = path.as_ref();
        log::debug!("saving {format} state to {}", path.display());
        self.save(File::create(path)?, format)
    }

    /// Loads from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CorticalError::IoError`] if the file cannot be opened.
    fn load_from_file<P: AsRef<Path>>(path: P, format: SerializableFormat) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading {format} state from {}", path.display());
        Self::load(File::open(path)?, format)
    }

    /// Saves with the format picked by [`SerializableFormat::from_path`].
    ///
    /// # Errors
    ///
    /// See [`save_to_file`](Self::save_to_file).
    fn save_to_file_auto<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let format = SerializableFormat::from_path(path.as_ref());
        self.save_to_file(path, format)
    }

    /// Loads with the format picked by [`SerializableFormat::from_path`].
    ///
    /// # Errors
    ///
    /// See [`load_from_file`](Self::load_from_file).
    fn load_from_file_auto<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = SerializableFormat::from_path(path.as_ref());
        Self::load_from_file(path, format)
    }
}

impl<T> Serializable for T where T: Serialize + DeserializeOwned + Sized {}
