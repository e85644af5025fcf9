//! ctfkit Core Library
//!
//! Reconciles capture-the-flag challenge definitions across the local
//! project, their upstream git repositories, and a remote challenge platform.

pub mod batch;
pub mod challenge;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs;
pub mod git;
pub mod process;
pub mod registry;
pub mod selector;

pub use error::{Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Batches
    pub use crate::batch::{Batch, BatchReport, BatchReporter, SilentReporter};

    // Challenges
    pub use crate::challenge::{
        Challenge, ChallengeDefinition, ChallengeField, CtfdClient, IgnoreSet, RemotePlatform,
        RemoteState,
    };

    // Commands
    pub use crate::commands::ProjectContext;

    // Configuration
    pub use crate::config::{ConfigStore, ProjectConfig, ProjectSettings};

    // Transport
    pub use crate::git::{PullStrategy, Transport, TransportKind};

    // Processes
    pub use crate::process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};

    // Registry
    pub use crate::registry::{ChallengeKey, Registry, SourceLocator};

    // Selection
    pub use crate::selector::ChallengeSelector;

    pub use crate::error::{Error, Result};
}
