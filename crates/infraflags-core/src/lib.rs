//! `infraflags-core`: verify that the infrastructure flags an application
//! requires are deployed to an environment.
//!
//! ```text
//! requirements file ──► RequirementSet ─┐
//!                                       ├─► reconcile ──► ReconciliationResult
//! platform (change set) ──► FlagMapping ┘
//! ```

pub mod check;
pub mod config;
pub mod error;
pub mod io;
pub mod mapping;
pub mod paths;
pub mod platform;
pub mod reconcile;
pub mod report;
pub mod requirements;
pub mod resolver;

pub use error::{FlagsError, Result, TransportError};
pub use mapping::FlagMapping;
pub use reconcile::{reconcile, ReconciliationResult, Status};
pub use requirements::{read_requirements, RequirementSet, RequirementSource};
pub use resolver::{Resolution, Resolver, ResolverSettings};
