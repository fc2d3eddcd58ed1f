//! Profile sources: discovery and loading of named profiles.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::schema::profile::{Profile, ValidationError};

/// A profile resource exists but is not well-formed structured data.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(String),
    #[error("profile '{profile}' could not be parsed: {source}")]
    Parse {
        profile: String,
        #[source]
        source: ParseError,
    },
    #[error("profile '{profile}' is invalid: {source}")]
    Invalid {
        profile: String,
        #[source]
        source: ValidationError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can resolve a profile identifier to a validated profile.
pub trait ProfileSource {
    /// Load and validate the profile named `profile_id`.
    fn load(&self, profile_id: &str) -> Result<Profile, ProfileError>;

    /// Identifiers starting with `prefix`, sorted, with the prefix's default
    /// profile first.
    fn discover(&self, prefix: &str) -> Vec<String>;
}

/// Profiles stored as `{prefix}{name}.json` (or `.ron`) files in one directory.
#[derive(Debug, Clone)]
pub struct ProfileDir {
    root: PathBuf,
}

impl ProfileDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, profile_id: &str) -> Option<PathBuf> {
        let plain = !profile_id.is_empty()
            && !profile_id.starts_with('.')
            && !profile_id.contains(&['/', '\\'][..]);
        plain.then(|| self.root.join(profile_id))
    }
}

impl ProfileSource for ProfileDir {
    fn load(&self, profile_id: &str) -> Result<Profile, ProfileError> {
        let path = self
            .resolve(profile_id)
            .ok_or_else(|| ProfileError::NotFound(profile_id.to_string()))?;

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ProfileError::NotFound(profile_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(profile = profile_id, path = %path.display(), "loading profile");
        let format = ProfileFormat::from_path(&path);
        parse_profile(profile_id, &contents, format)
    }

    fn discover(&self, prefix: &str) -> Vec<String> {
        let names: Vec<String> = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries
                .flatten()
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| ProfileFormat::from_path(Path::new(name)).is_some())
                .collect(),
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "profile directory unreadable");
                Vec::new()
            }
        };
        let found = order_discovered(names, prefix);
        debug!(prefix, count = found.len(), "discovered profiles");
        found
    }
}

/// Profiles held in memory, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfiles {
    profiles: FxHashMap<String, Profile>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile_id: impl Into<String>, profile: Profile) {
        self.profiles.insert(profile_id.into(), profile);
    }

    /// Parse and validate `contents` in the format implied by `profile_id`'s
    /// extension, then store it.
    pub fn insert_source(&mut self, profile_id: &str, contents: &str) -> Result<(), ProfileError> {
        let format = ProfileFormat::from_path(Path::new(profile_id)).unwrap_or(ProfileFormat::Json);
        let profile = parse_profile(profile_id, contents, Some(format))?;
        self.insert(profile_id, profile);
        Ok(())
    }
}

impl ProfileSource for InMemoryProfiles {
    fn load(&self, profile_id: &str) -> Result<Profile, ProfileError> {
        self.profiles
            .get(profile_id)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(profile_id.to_string()))
    }

    fn discover(&self, prefix: &str) -> Vec<String> {
        order_discovered(self.profiles.keys().cloned().collect(), prefix)
    }
}

/// Serialization format of a stored profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Json,
    Ron,
}

impl ProfileFormat {
    /// Format by file extension; `None` for anything else.
    pub fn from_path(path: &Path) -> Option<ProfileFormat> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Some(ProfileFormat::Json),
            Some("ron") => Some(ProfileFormat::Ron),
            _ => None,
        }
    }
}

/// Parse profile text and validate it. Unknown formats are read as JSON.
pub fn parse_profile(
    profile_id: &str,
    contents: &str,
    format: Option<ProfileFormat>,
) -> Result<Profile, ProfileError> {
    let parse_error = |source: ParseError| ProfileError::Parse {
        profile: profile_id.to_string(),
        source,
    };
    let raw: Value = match format.unwrap_or(ProfileFormat::Json) {
        ProfileFormat::Json => {
            serde_json::from_str(contents).map_err(|e| parse_error(ParseError::from(e)))?
        }
        ProfileFormat::Ron => {
            ron::from_str(contents).map_err(|e| parse_error(ParseError::from(e)))?
        }
    };
    Profile::validate(&raw).map_err(|source| ProfileError::Invalid {
        profile: profile_id.to_string(),
        source,
    })
}

/// Keep names starting with `prefix`, sort them, and move the prefix's
/// default profile to the front. Falls back to `{prefix}default.json`
/// when nothing matches.
pub fn order_discovered(names: Vec<String>, prefix: &str) -> Vec<String> {
    let mut found: Vec<String> = names
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect();
    found.sort();

    let default_json = format!("{}default.json", prefix);
    let default_ron = format!("{}default.ron", prefix);
    let default_pos = found
        .iter()
        .position(|n| *n == default_json)
        .or_else(|| found.iter().position(|n| *n == default_ron));
    if let Some(pos) = default_pos {
        let default = found.remove(pos);
        found.insert(0, default);
    }

    if found.is_empty() {
        found.push(default_json);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"{"templates": ["a {x}"], "pools": {"x": ["1"]}}"#;

    #[test]
    fn order_puts_default_first() {
        let names = vec![
            "style_watercolor.json".to_string(),
            "style_default.json".to_string(),
            "style_anime.json".to_string(),
            "mood_default.json".to_string(),
        ];
        assert_eq!(
            order_discovered(names, "style_"),
            vec!["style_default.json", "style_anime.json", "style_watercolor.json"]
        );
    }

    #[test]
    fn order_falls_back_to_prefixed_default() {
        assert_eq!(order_discovered(Vec::new(), "mood_"), vec!["mood_default.json"]);
        assert_eq!(order_discovered(Vec::new(), ""), vec!["default.json"]);
    }

    #[test]
    fn order_prefers_json_default_over_ron() {
        let names = vec!["default.ron".to_string(), "default.json".to_string(), "a.json".to_string()];
        assert_eq!(order_discovered(names, "")[0], "default.json");
    }

    #[test]
    fn dir_loads_and_discovers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mood_default.json"), VALID).unwrap();
        fs::write(dir.path().join("mood_dark.json"), VALID).unwrap();
        fs::write(dir.path().join("mood_notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("mood_subdir.json")).unwrap();

        let source = ProfileDir::new(dir.path());
        assert_eq!(
            source.discover("mood_"),
            vec!["mood_default.json", "mood_dark.json"]
        );
        let profile = source.load("mood_dark.json").unwrap();
        assert_eq!(profile.templates().len(), 1);
    }

    #[test]
    fn dir_missing_profile_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProfileDir::new(dir.path()).load("nope.json").unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(ref id) if id == "nope.json"));
    }

    #[test]
    fn dir_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProfileDir::new(dir.path());
        assert!(matches!(source.load("../etc/passwd"), Err(ProfileError::NotFound(_))));
        assert!(matches!(source.load(".hidden.json"), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn dir_missing_root_discovers_fallback() {
        let source = ProfileDir::new("/definitely/not/a/real/profile/dir");
        assert_eq!(source.discover("scene_"), vec!["scene_default.json"]);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_profile("bad.json", "{not json", Some(ProfileFormat::Json)).unwrap_err();
        assert!(matches!(err, ProfileError::Parse { source: ParseError::Json(_), .. }));
    }

    #[test]
    fn incomplete_profile_is_invalid() {
        let err = parse_profile("half.json", r#"{"templates": ["t"]}"#, None).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Invalid { source: ValidationError::MissingField("pools"), .. }
        ));
    }

    #[test]
    fn ron_profile_parses() {
        let ron_text = r#"{
            "name": "Ron profile",
            "templates": ["{b} then {a}"],
            "pools": {"b": ["B"], "a": ["A"]},
        }"#;
        let profile = parse_profile("p.ron", ron_text, Some(ProfileFormat::Ron)).unwrap();
        assert_eq!(profile.name(), Some("Ron profile"));
        let order: Vec<&str> = profile.pools().keys().map(String::as_str).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn malformed_ron_is_parse_error() {
        let err = parse_profile("bad.ron", "{ templates: ", Some(ProfileFormat::Ron)).unwrap_err();
        assert!(matches!(err, ProfileError::Parse { source: ParseError::Ron(_), .. }));
    }

    #[test]
    fn in_memory_source() {
        let mut source = InMemoryProfiles::new();
        source.insert_source("style_default.json", VALID).unwrap();
        source.insert_source("style_ink.json", VALID).unwrap();
        assert_eq!(
            source.discover("style_"),
            vec!["style_default.json", "style_ink.json"]
        );
        assert!(source.load("style_ink.json").is_ok());
        assert!(matches!(source.load("x.json"), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn in_memory_insert_rejects_invalid() {
        let mut source = InMemoryProfiles::new();
        let err = source
            .insert_source("empty.json", r#"{"templates": [], "pools": {}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Invalid { source: ValidationError::EmptyTemplates, .. }
        ));
        assert!(source.discover("").contains(&"default.json".to_string()));
    }
}
