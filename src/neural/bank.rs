//! Model bank
//!
//! Discovers the trained weight files for one knob and cycles through
//! them in file-name order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{MagicKnobError, Result};
use crate::neural::weights::WeightSet;

/// Extension of weight files
const MODEL_EXTENSION: &str = "json";

/// Number of underscore-separated fields in a model file stem
pub const NUM_NAME_FIELDS: usize = 5;

/// Index of the field selecting the bank
const KIND_FIELD: usize = 3;

/// Index of the field shown to the user
const LABEL_FIELD: usize = 4;

// ============================================================================
// Knob Identifier
// ============================================================================

/// The two model-driven knobs, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnobId {
    /// Distortion stage
    Dist,
    /// Low-pass stage
    Lpf,
}

impl KnobId {
    pub const ALL: [KnobId; 2] = [KnobId::Dist, KnobId::Lpf];

    /// The `kind` field value that selects this knob's bank
    pub fn kind_tag(&self) -> &'static str {
        match self {
            KnobId::Dist => "dist",
            KnobId::Lpf => "lpf2",
        }
    }
}

impl fmt::Display for KnobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnobId::Dist => write!(f, "dist"),
            KnobId::Lpf => write!(f, "lpf"),
        }
    }
}

// ============================================================================
// Model File Name
// ============================================================================

/// A parsed `{experiment}_{variant}_{arch}_{kind}_{label}.json` file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFileName {
    file_name: String,
    fields: [String; NUM_NAME_FIELDS],
}

impl ModelFileName {
    /// Tokenize a file name into exactly five non-empty fields
    pub fn parse(file_name: &str) -> Result<Self> {
        let invalid = |reason: &'static str| MagicKnobError::InvalidModelFileName {
            name: file_name.to_string(),
            reason,
        };

        let stem = file_name
            .strip_suffix(MODEL_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| invalid("missing .json extension"))?;

        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() != NUM_NAME_FIELDS {
            return Err(invalid("expected exactly 5 underscore-separated fields"));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty name field"));
        }

        let fields = [0, 1, 2, 3, 4].map(|i| parts[i].to_string());
        Ok(Self {
            file_name: file_name.to_string(),
            fields,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn fields(&self) -> &[String; NUM_NAME_FIELDS] {
        &self.fields
    }

    /// The bank selector (`dist` or `lpf2`)
    pub fn kind(&self) -> &str {
        &self.fields[KIND_FIELD]
    }

    /// The human-readable model name
    pub fn label(&self) -> &str {
        &self.fields[LABEL_FIELD]
    }
}

// ============================================================================
// Model Bank
// ============================================================================

/// Ordered, cyclically indexed model files for one knob
#[derive(Debug, Clone)]
pub struct ModelBank {
    knob: KnobId,
    directory: PathBuf,
    entries: Vec<ModelFileName>,
    /// `None` until the first successful `cycle_next`
    current: Option<usize>,
}

impl ModelBank {
    /// Scan `directory` for this knob's model files
    ///
    /// Entries that are not `.json` files with a well-formed name of the
    /// right kind are skipped.
    pub fn discover(directory: &Path, knob: KnobId) -> Result<Self> {
        if !directory.is_dir() {
            return Err(MagicKnobError::FileUnreadable {
                path: directory.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", directory.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                debug!("Ignoring non UTF-8 file name {:?}", entry.file_name());
                continue;
            };

            match ModelFileName::parse(file_name) {
                Ok(parsed) if parsed.kind() == knob.kind_tag() => entries.push(parsed),
                Ok(_) => {}
                Err(e) => debug!("Ignoring {}: {}", file_name, e),
            }
        }

        entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for model in &entries {
            info!("Found {} model: {}", knob, model.file_name());
        }

        Ok(Self {
            knob,
            directory: directory.to_path_buf(),
            entries,
            current: None,
        })
    }

    /// Build a bank from already-parsed entries (sorted here)
    pub fn from_entries(directory: &Path, knob: KnobId, mut entries: Vec<ModelFileName>) -> Self {
        entries.retain(|e| e.kind() == knob.kind_tag());
        entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));
        Self {
            knob,
            directory: directory.to_path_buf(),
            entries,
            current: None,
        }
    }

    /// Load the next model in the cycle
    ///
    /// Entries that fail to load are skipped, so one broken file never
    /// hides the ones after it. The index only moves to an entry that
    /// loaded; if none does, the bank (and the active model) stay where
    /// they were and the last load error is returned.
    pub fn cycle_next(&mut self, hidden_size: usize) -> Result<Arc<WeightSet>> {
        let len = self.entries.len();
        if len == 0 {
            return Err(MagicKnobError::NoModelsFound {
                kind: self.knob.kind_tag(),
            });
        }

        let start = self.current.map_or(0, |i| (i + 1) % len);
        let mut last_error = None;

        for step in 0..len {
            let index = (start + step) % len;
            let path = self.directory.join(self.entries[index].file_name());
            info!("Loading {} model at path: {}", self.knob, path.display());

            match WeightSet::load(&path, hidden_size) {
                Ok(weights) => {
                    self.current = Some(index);
                    return Ok(Arc::new(weights));
                }
                Err(e) => {
                    warn!("Skipping {} model {}: {}", self.knob, path.display(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(MagicKnobError::NoModelsFound {
            kind: self.knob.kind_tag(),
        }))
    }

    /// Label (fifth name field) of the current model
    pub fn current_label(&self) -> Result<&str> {
        self.current_entry().map(ModelFileName::label)
    }

    /// The current model file
    pub fn current_entry(&self) -> Result<&ModelFileName> {
        self.current
            .and_then(|i| self.entries.get(i))
            .ok_or(MagicKnobError::NoModelSelected {
                kind: self.knob.kind_tag(),
            })
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn knob(&self) -> KnobId {
        self.knob
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn entries(&self) -> &[ModelFileName] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
