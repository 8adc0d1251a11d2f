pub mod check;
pub mod config;
pub mod flags;
pub mod requirements;
