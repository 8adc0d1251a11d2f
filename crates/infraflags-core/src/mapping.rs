use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Field of the computed projection holding the canonical flag → environments form.
pub const BY_FLAG_FIELD: &str = "byFlag";
/// Optional derived field; validated against `byFlag` when present.
pub const BY_ENVIRONMENT_FIELD: &str = "byEnvironment";

// ---------------------------------------------------------------------------
// FlagMapping
// ---------------------------------------------------------------------------

/// Deployed-state relation between flags and the environments they are active in.
///
/// Stored canonically as flag → set of environments. Flags with no environment
/// are not part of the relation and are dropped on construction, so the two
/// projections always describe exactly the same set of (flag, environment) pairs.
/// Environments declared with no flags are remembered separately so they still
/// count as known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagMapping {
    flags: BTreeMap<String, BTreeSet<String>>,
    idle: BTreeSet<String>,
}

impl FlagMapping {
    /// Build from flag → environments pairs. Duplicates collapse.
    pub fn from_by_flag<I, F, E, S>(by_flag: I) -> Self
    where
        I: IntoIterator<Item = (F, E)>,
        F: Into<String>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (flag, envs) in by_flag {
            let envs: BTreeSet<String> = envs.into_iter().map(Into::into).collect();
            if envs.is_empty() {
                continue;
            }
            flags.entry(flag.into()).or_default().extend(envs);
        }
        Self {
            flags,
            idle: BTreeSet::new(),
        }
    }

    /// Build from environment → flags pairs, inverting into the canonical form.
    pub fn from_by_environment<I, E, F, S>(by_env: I) -> Self
    where
        I: IntoIterator<Item = (E, F)>,
        E: Into<String>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut declared = BTreeSet::new();
        for (env, env_flags) in by_env {
            let env = env.into();
            for flag in env_flags {
                flags.entry(flag.into()).or_default().insert(env.clone());
            }
            declared.insert(env);
        }
        let idle = declared
            .into_iter()
            .filter(|env| !flags.values().any(|envs| envs.contains(env)))
            .collect();
        Self { flags, idle }
    }

    /// Flag → sorted environments.
    pub fn by_flag(&self) -> BTreeMap<String, Vec<String>> {
        self.flags
            .iter()
            .map(|(flag, envs)| (flag.clone(), envs.iter().cloned().collect()))
            .collect()
    }

    /// Environment → sorted flags. Declared environments with no flags map to
    /// an empty list.
    pub fn by_environment(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = self
            .idle
            .iter()
            .map(|env| (env.clone(), BTreeSet::new()))
            .collect();
        for (flag, envs) in &self.flags {
            for env in envs {
                out.entry(env.clone()).or_default().insert(flag.clone());
            }
        }
        out.into_iter()
            .map(|(env, flags)| (env, flags.into_iter().collect()))
            .collect()
    }

    /// Flags active in one environment, sorted. Empty for unknown environments.
    pub fn flags_in(&self, environment: &str) -> Vec<String> {
        self.flags
            .iter()
            .filter(|(_, envs)| envs.contains(environment))
            .map(|(flag, _)| flag.clone())
            .collect()
    }

    /// Every environment mentioned by the snapshot, sorted.
    pub fn environments(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self.flags.values().flatten().chain(&self.idle).collect();
        all.into_iter().cloned().collect()
    }

    pub fn has_environment(&self, environment: &str) -> bool {
        self.idle.contains(environment)
            || self.flags.values().any(|envs| envs.contains(environment))
    }

    /// True when no flag is active anywhere.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Parse a computed projection payload.
    ///
    /// The payload is either an object or a string holding JSON (the platform
    /// stores computed values as strings). `byFlag` is required; `byEnvironment`,
    /// when present, must agree with it.
    pub fn from_projection(payload: &serde_json::Value) -> Result<Self, String> {
        let decoded;
        let value = match payload {
            serde_json::Value::String(s) => {
                decoded = serde_json::from_str::<serde_json::Value>(s)
                    .map_err(|e| format!("projection string is not valid JSON: {e}"))?;
                &decoded
            }
            other => other,
        };

        let obj = value
            .as_object()
            .ok_or_else(|| "projection is not an object".to_string())?;
        let by_flag = obj
            .get(BY_FLAG_FIELD)
            .ok_or_else(|| format!("projection has no '{BY_FLAG_FIELD}' field"))?;
        let by_flag: BTreeMap<String, Vec<String>> = serde_json::from_value(by_flag.clone())
            .map_err(|e| format!("'{BY_FLAG_FIELD}' is not a map of flag to environments: {e}"))?;
        let mut mapping = Self::from_by_flag(by_flag);

        if let Some(by_env) = obj.get(BY_ENVIRONMENT_FIELD) {
            let by_env: BTreeMap<String, Vec<String>> = serde_json::from_value(by_env.clone())
                .map_err(|e| {
                    format!("'{BY_ENVIRONMENT_FIELD}' is not a map of environment to flags: {e}")
                })?;
            let inverted = Self::from_by_environment(by_env);
            if inverted.flags != mapping.flags {
                return Err(format!(
                    "'{BY_ENVIRONMENT_FIELD}' disagrees with '{BY_FLAG_FIELD}'"
                ));
            }
            mapping.idle = inverted.idle;
        }

        Ok(mapping)
    }
}

// ---------------------------------------------------------------------------
// Serialized view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingView {
    pub by_flag: BTreeMap<String, Vec<String>>,
    pub by_environment: BTreeMap<String, Vec<String>>,
}

impl From<&FlagMapping> for MappingView {
    fn from(m: &FlagMapping) -> Self {
        Self {
            by_flag: m.by_flag(),
            by_environment: m.by_environment(),
        }
    }
}

impl Serialize for FlagMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MappingView::from(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> FlagMapping {
        FlagMapping::from_by_flag([
            ("redis", vec!["prod", "dev", "dev"]),
            ("baseline", vec!["pr", "dev", "preprod", "prod"]),
            ("cdn", vec!["prod"]),
        ])
    }

    #[test]
    fn by_flag_is_sorted_and_deduplicated() {
        let by_flag = sample().by_flag();
        assert_eq!(by_flag["redis"], vec!["dev", "prod"]);
        assert_eq!(by_flag["baseline"], vec!["dev", "pr", "preprod", "prod"]);
    }

    #[test]
    fn by_environment_is_consistent_with_by_flag() {
        let m = sample();
        let by_flag = m.by_flag();
        let by_env = m.by_environment();
        for (env, flags) in &by_env {
            for flag in flags {
                assert!(by_flag[flag].contains(env));
            }
        }
        for (flag, envs) in &by_flag {
            for env in envs {
                assert!(by_env[env].contains(flag));
            }
        }
        assert_eq!(by_env["prod"], vec!["baseline", "cdn", "redis"]);
        assert_eq!(by_env["pr"], vec!["baseline"]);
    }

    #[test]
    fn round_trip_through_by_environment() {
        let m = sample();
        let again = FlagMapping::from_by_environment(m.by_environment());
        assert_eq!(again, m);
        assert_eq!(again.by_flag(), m.by_flag());
    }

    #[test]
    fn flags_without_environments_are_dropped() {
        let m = FlagMapping::from_by_flag([("orphan", Vec::<String>::new()), ("cdn", vec!["prod".into()])]);
        assert_eq!(m.by_flag().len(), 1);
        assert_eq!(FlagMapping::from_by_environment(m.by_environment()), m);
    }

    #[test]
    fn flags_in_unknown_environment_is_empty() {
        let m = sample();
        assert!(m.flags_in("staging").is_empty());
        assert!(!m.has_environment("staging"));
        assert_eq!(m.flags_in("dev"), vec!["baseline", "redis"]);
        assert_eq!(m.environments(), vec!["dev", "pr", "preprod", "prod"]);
    }

    #[test]
    fn projection_from_object() {
        let payload = json!({"byFlag": {"redis": ["prod"], "baseline": ["dev", "prod"]}});
        let m = FlagMapping::from_projection(&payload).unwrap();
        assert_eq!(m.flags_in("prod"), vec!["baseline", "redis"]);
    }

    #[test]
    fn projection_from_json_string() {
        let payload = json!("{\"byFlag\":{\"redis\":[\"dev\"]},\"byEnvironment\":{\"dev\":[\"redis\"]}}");
        let m = FlagMapping::from_projection(&payload).unwrap();
        assert_eq!(m.flags_in("dev"), vec!["redis"]);
    }

    #[test]
    fn projection_missing_by_flag_is_rejected() {
        let err = FlagMapping::from_projection(&json!({"byEnvironment": {}})).unwrap_err();
        assert!(err.contains("byFlag"));
    }

    #[test]
    fn projection_garbage_string_is_rejected() {
        let err = FlagMapping::from_projection(&json!("not json {")).unwrap_err();
        assert!(err.contains("not valid JSON"));
    }

    #[test]
    fn projection_inconsistent_by_environment_is_rejected() {
        let payload = json!({
            "byFlag": {"redis": ["prod"]},
            "byEnvironment": {"prod": ["redis"], "dev": ["redis"]}
        });
        let err = FlagMapping::from_projection(&payload).unwrap_err();
        assert!(err.contains("disagrees"));
    }

    #[test]
    fn projection_keeps_environments_without_flags() {
        let payload = json!({
            "byFlag": {"redis": ["prod"]},
            "byEnvironment": {"prod": ["redis"], "pr": []}
        });
        let m = FlagMapping::from_projection(&payload).unwrap();
        assert!(m.has_environment("pr"));
        assert!(m.flags_in("pr").is_empty());
        assert_eq!(m.environments(), vec!["pr", "prod"]);
        assert_eq!(m.by_environment()["pr"], Vec::<String>::new());
        assert_eq!(m.by_flag().len(), 1);
        assert_eq!(FlagMapping::from_by_environment(m.by_environment()), m);
    }

    #[test]
    fn serializes_both_projections() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["byFlag"]["cdn"], json!(["prod"]));
        assert_eq!(v["byEnvironment"]["pr"], json!(["baseline"]));
    }
}
