//! Git transport for challenge source trees.
//!
//! This module moves a challenge directory between the project repository
//! and an independent upstream repository:
//! - `subtree`: built-in `git subtree` with squash imports (default)
//! - `subrepo`: the external `git subrepo` helper (opt-in via `use_subrepo`)
//!
//! All git invocations go through a [`crate::process::ProcessRunner`].

mod remote;
mod subrepo;
mod subtree;
mod transport;
mod worktree;

pub use remote::{default_branch, parse_symref_head};
pub use subrepo::SubrepoTransport;
pub use subtree::SubtreeTransport;
pub use transport::{PullStrategy, Transport, TransportKind, select_transport, subrepo_available};
pub use worktree::WorkTree;
