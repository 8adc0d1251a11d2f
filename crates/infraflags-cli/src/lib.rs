//! Library half of the `infraflags` binary: pieces with no clap dependency.

pub mod retry;
pub mod root;
