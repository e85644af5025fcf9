//! Challenge definitions and their reconciliation with the remote platform.
//!
//! - [`Challenge`]: a loaded `challenge.yml` with create/sync/verify/mirror
//! - [`RemotePlatform`]: the platform boundary, implemented by [`CtfdClient`]
//! - [`IgnoreSet`]: fields a pass leaves alone

mod ctfd;
mod definition;
mod entity;
mod field;
mod fields;
mod remote;

pub use ctfd::CtfdClient;
pub use definition::{
    ChallengeDefinition, DEFAULT_CHALLENGE_TYPE, DEFAULT_FLAG_TYPE, FlagSpec, HintSpec,
    Requirement,
};
pub use entity::{Challenge, RemoteState, challenge_slug};
pub use field::{ChallengeField, IgnoreSet};
pub use remote::{
    Attachment, ChallengePayload, RemoteChallenge, RemoteFlag, RemoteHint, RemotePlatform,
    RemoteSummary, api_name, attachment_name, find_by_name,
};
