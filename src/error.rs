//! Error handling for MagicKnob
//!
//! Errors are raised on the control thread only. The audio thread may
//! see a `TopologyMismatch` from `install_weights`, which never allocates.

use thiserror::Error;

/// Result type alias for MagicKnob operations
pub type Result<T> = std::result::Result<T, MagicKnobError>;

/// Main error type for MagicKnob operations
#[derive(Error, Debug)]
pub enum MagicKnobError {
    // Weight file errors
    #[error("Cannot read file: {path}")]
    FileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed weight file {path}: {reason}")]
    MalformedWeightFile { path: String, reason: String },

    #[error("Topology mismatch in {what}: expected {expected}, found {found}")]
    TopologyMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    // Model bank errors
    #[error("Invalid model file name '{name}': {reason}")]
    InvalidModelFileName { name: String, reason: &'static str },

    #[error("No '{kind}' models found")]
    NoModelsFound { kind: &'static str },

    #[error("No '{kind}' model selected yet")]
    NoModelSelected { kind: &'static str },

    // Trainer errors
    #[error("No training data: add at least one sample before training")]
    NoTrainingData,

    #[error("Regression model has not been trained")]
    NotTrained,

    #[error("Expected {expected} outputs per training sample, got {found}")]
    OutputWidthMismatch { expected: usize, found: usize },

    #[error("A background training run is already in progress")]
    TrainingInProgress,

    #[error("Background training failed: {reason}")]
    TrainingFailed { reason: String },

    // Audio I/O errors
    #[error("Failed to read audio file: {path}")]
    AudioReadError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWriteError {
        path: String,
        #[source]
        source: hound::Error,
    },

    #[error("Invalid audio: {reason}")]
    InvalidAudio { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MagicKnobError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MagicKnobError::FileUnreadable { .. } => "FILE_UNREADABLE",
            MagicKnobError::MalformedWeightFile { .. } => "MALFORMED_WEIGHT_FILE",
            MagicKnobError::TopologyMismatch { .. } => "TOPOLOGY_MISMATCH",
            MagicKnobError::InvalidModelFileName { .. } => "INVALID_MODEL_FILE_NAME",
            MagicKnobError::NoModelsFound { .. } => "NO_MODELS_FOUND",
            MagicKnobError::NoModelSelected { .. } => "NO_MODEL_SELECTED",
            MagicKnobError::NoTrainingData => "NO_TRAINING_DATA",
            MagicKnobError::NotTrained => "NOT_TRAINED",
            MagicKnobError::OutputWidthMismatch { .. } => "OUTPUT_WIDTH_MISMATCH",
            MagicKnobError::TrainingInProgress => "TRAINING_IN_PROGRESS",
            MagicKnobError::TrainingFailed { .. } => "TRAINING_FAILED",
            MagicKnobError::AudioReadError { .. } => "AUDIO_READ_ERROR",
            MagicKnobError::AudioWriteError { .. } => "AUDIO_WRITE_ERROR",
            MagicKnobError::InvalidAudio { .. } => "INVALID_AUDIO",
            MagicKnobError::InvalidConfig { .. } => "INVALID_CONFIG",
            MagicKnobError::Io(_) => "IO_ERROR",
            MagicKnobError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the audio path keeps running unchanged after this error.
    ///
    /// Only configuration and output-file errors are not: they stop an
    /// offline render before it starts.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            MagicKnobError::InvalidConfig { .. } | MagicKnobError::AudioWriteError { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            MagicKnobError::FileUnreadable { .. } => vec![
                "Check the model directory path is correct",
                "Verify the file permissions allow reading",
            ],
            MagicKnobError::MalformedWeightFile { .. } => vec![
                "Re-export the model with save_for_rtneural",
                "Name the recurrent layer 'lstm' and the output layer 'dense'",
            ],
            MagicKnobError::TopologyMismatch { .. } => vec![
                "Train the model with 2 inputs, one LSTM layer and 1 output",
                "Match the hidden size the plugin was compiled with",
            ],
            MagicKnobError::NoModelsFound { .. } => vec![
                "Place model files named a_b_c_<kind>_<label>.json in the model directory",
                "Use 'dist' or 'lpf2' as the fourth name field",
            ],
            MagicKnobError::NoModelSelected { .. } => vec!["Cycle the knob once to load a model"],
            MagicKnobError::NoTrainingData => {
                vec!["Add at least one training datapoint before training"]
            }
            MagicKnobError::NotTrained => vec!["Train the SuperKnob before using it"],
            MagicKnobError::TrainingInProgress => {
                vec!["Wait for the running training to finish"]
            }
            _ => vec![],
        }
    }
}
