//! Filesystem primitives shared across features.

pub mod digest;

pub use digest::{atomic_write, digest_bytes, digest_file, write_if_changed};
