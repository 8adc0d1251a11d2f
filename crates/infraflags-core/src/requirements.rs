use crate::error::{FlagsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_REQUIREMENTS_FILE: &str = "infraflags.yaml";
pub const DEFAULT_REQUIREMENTS_KEY: &str = "flags";

// ---------------------------------------------------------------------------
// RequirementSet
// ---------------------------------------------------------------------------

/// Flags an application declares it needs, deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RequirementSet(Vec<String>);

impl<'de> Deserialize<'de> for RequirementSet {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        Vec::<String>::deserialize(d).map(Self::new)
    }
}

impl RequirementSet {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for flag in flags {
            let flag = flag.into();
            if seen.insert(flag.clone()) {
                out.push(flag);
            }
        }
        Self(out)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// RequirementSource
// ---------------------------------------------------------------------------

/// Outcome of reading a requirements artifact. Callers match on all three.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementSource {
    /// The document parsed. `warnings` is non-empty when the key was missing or
    /// held something other than a list of strings.
    Loaded {
        set: RequirementSet,
        warnings: Vec<String>,
    },
    /// The document exists but is not valid YAML.
    ParseError(String),
    /// No document at the path.
    Absent,
}

impl RequirementSource {
    /// Collapse into a set, turning a parse failure into `ConfigurationError`.
    pub fn into_set(self, path: &Path) -> Result<RequirementSet> {
        match self {
            RequirementSource::Loaded { set, warnings } => {
                for w in &warnings {
                    tracing::warn!(path = %path.display(), "{w}");
                }
                Ok(set)
            }
            RequirementSource::ParseError(diagnostic) => Err(FlagsError::Configuration {
                path: path.to_path_buf(),
                diagnostic,
            }),
            RequirementSource::Absent => Ok(RequirementSet::empty()),
        }
    }
}

/// Parse requirement document text. `key` names the list of flags.
pub fn parse_requirements(text: &str, key: &str) -> RequirementSource {
    if text.trim().is_empty() {
        return RequirementSource::Loaded {
            set: RequirementSet::empty(),
            warnings: Vec::new(),
        };
    }

    let doc: serde_yaml::Value = match serde_yaml::from_str(text) {
        Ok(v) => v,
        Err(e) => return RequirementSource::ParseError(e.to_string()),
    };

    let Some(value) = doc.get(key) else {
        return RequirementSource::Loaded {
            set: RequirementSet::empty(),
            warnings: vec![format!("no '{key}' key found; treating as no requirements")],
        };
    };

    let flags: Option<Vec<&str>> = value
        .as_sequence()
        .and_then(|seq| seq.iter().map(|v| v.as_str()).collect());

    match flags {
        Some(flags) => RequirementSource::Loaded {
            set: RequirementSet::new(flags),
            warnings: Vec::new(),
        },
        None => RequirementSource::Loaded {
            set: RequirementSet::empty(),
            warnings: vec![format!(
                "'{key}' is not a list of strings; treating as no requirements"
            )],
        },
    }
}

/// Read the artifact at `path` without interpreting failures.
pub fn read_source(path: &Path, key: &str) -> Result<RequirementSource> {
    if !path.exists() {
        return Ok(RequirementSource::Absent);
    }
    let text = std::fs::read_to_string(path)?;
    Ok(parse_requirements(&text, key))
}

/// Load the requirement set for an application.
///
/// A missing file means no requirements. A file that does not parse is a
/// `ConfigurationError`; a parsed file without a usable `key` is empty with a
/// logged warning.
pub fn read_requirements(path: &Path, key: &str) -> Result<RequirementSet> {
    read_source(path, key)?.into_set(path)
}
