//! Generator configurations: which profiles a generator draws from and
//! which filter hints it accepts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A filter hint a generator accepts, with its allowed options.
///
/// The first option is the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub tooltip: String,
}

impl FilterField {
    pub fn default_option(&self) -> Option<&str> {
        self.options.first().map(String::as_str)
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

/// Configuration for one generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub id: String,
    pub display_name: String,
    /// Profile filename prefix, e.g. `camera_angle_`.
    #[serde(default)]
    pub profile_prefix: String,
    /// Used when a request names no profile.
    pub default_profile: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub filters: Vec<FilterField>,
}

impl GeneratorConfig {
    /// A generator over every profile, with `default.json` as default.
    pub fn generic() -> GeneratorConfig {
        GeneratorConfig {
            id: "generic".to_string(),
            display_name: "Prompt".to_string(),
            profile_prefix: String::new(),
            default_profile: "default.json".to_string(),
            category: "Zeroprompt".to_string(),
            filters: Vec::new(),
        }
    }

    pub fn filter(&self, name: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.name == name)
    }
}

/// Generator configurations by id.
#[derive(Debug, Clone, Default)]
pub struct GeneratorCatalog {
    generators: HashMap<String, GeneratorConfig>,
}

impl GeneratorCatalog {
    /// The stock generators: subject, camera, style, scene, lighting and
    /// composition families.
    pub fn builtin() -> GeneratorCatalog {
        let mut catalog = GeneratorCatalog::default();
        for spec in BUILTIN {
            catalog.register(spec.to_config());
        }
        catalog
    }

    pub fn register(&mut self, config: GeneratorConfig) {
        self.generators.insert(config.id.clone(), config);
    }

    pub fn get(&self, id: &str) -> Option<&GeneratorConfig> {
        self.generators.get(id)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Generators sorted by category, then id.
    pub fn iter_sorted(&self) -> Vec<&GeneratorConfig> {
        let mut all: Vec<_> = self.generators.values().collect();
        all.sort_by(|a, b| (&a.category, &a.id).cmp(&(&b.category, &b.id)));
        all
    }

    /// Load generators from a RON file containing a list of
    /// `GeneratorConfig`s. Entries replace existing ones with the same id.
    pub fn load_from_ron(&mut self, path: &Path) -> Result<(), CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        self.parse_ron(&contents)
    }

    pub fn parse_ron(&mut self, input: &str) -> Result<(), CatalogError> {
        let configs: Vec<GeneratorConfig> = ron::from_str(input)?;
        for config in configs {
            self.register(config);
        }
        Ok(())
    }
}

struct BuiltinSpec {
    id: &'static str,
    display_name: &'static str,
    prefix: &'static str,
    category: &'static str,
    filters: &'static [(&'static str, &'static str, &'static [&'static str])],
}

impl BuiltinSpec {
    fn to_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            id: self.id.to_string(),
            display_name: self.display_name.to_string(),
            profile_prefix: self.prefix.to_string(),
            default_profile: format!("{}default.json", self.prefix),
            category: self.category.to_string(),
            filters: self
                .filters
                .iter()
                .map(|(name, tooltip, options)| FilterField {
                    name: name.to_string(),
                    options: options.iter().map(|o| o.to_string()).collect(),
                    tooltip: tooltip.to_string(),
                })
                .collect(),
        }
    }
}

const BUILTIN: &[BuiltinSpec] = &[
    BuiltinSpec {
        id: "subject_description",
        display_name: "Subject Description",
        prefix: "subject_description_",
        category: "Subject",
        filters: &[(
            "subject_type",
            "Filter generation by subject type",
            &["any", "person", "character", "object", "creature", "vehicle", "architecture"],
        )],
    },
    BuiltinSpec {
        id: "subject_position",
        display_name: "Subject Position",
        prefix: "subject_position_",
        category: "Subject",
        filters: &[],
    },
    BuiltinSpec {
        id: "subject_action",
        display_name: "Subject Action",
        prefix: "subject_action_",
        category: "Subject",
        filters: &[(
            "action_intensity",
            "Control action intensity level",
            &["any", "subtle", "moderate", "dynamic", "extreme"],
        )],
    },
    BuiltinSpec {
        id: "subject_pose",
        display_name: "Subject Pose",
        prefix: "subject_pose_",
        category: "Subject",
        filters: &[],
    },
    BuiltinSpec {
        id: "camera_angle",
        display_name: "Camera Angle",
        prefix: "camera_angle_",
        category: "Camera",
        filters: &[(
            "angle_type",
            "Filter by angle type",
            &["any", "eye_level", "high", "low", "birds_eye", "worms_eye", "dutch"],
        )],
    },
    BuiltinSpec {
        id: "camera_distance",
        display_name: "Camera Distance",
        prefix: "camera_distance_",
        category: "Camera",
        filters: &[],
    },
    BuiltinSpec {
        id: "camera_dof",
        display_name: "Camera DoF",
        prefix: "camera_dof_",
        category: "Camera",
        filters: &[(
            "dof_style",
            "Depth of field style hint",
            &["any", "shallow", "moderate", "deep", "bokeh_heavy", "everything_sharp"],
        )],
    },
    BuiltinSpec {
        id: "camera_focus",
        display_name: "Camera Focus",
        prefix: "camera_focus_",
        category: "Camera",
        filters: &[],
    },
    BuiltinSpec {
        id: "style",
        display_name: "Style",
        prefix: "style_",
        category: "Style",
        filters: &[(
            "style_category",
            "Filter by style category",
            &["any", "photorealistic", "artistic", "cinematic", "anime", "illustration", "vintage"],
        )],
    },
    BuiltinSpec {
        id: "mood",
        display_name: "Mood",
        prefix: "mood_",
        category: "Style",
        filters: &[(
            "mood_valence",
            "Emotional valence hint",
            &["any", "positive", "negative", "neutral", "tense", "peaceful"],
        )],
    },
    BuiltinSpec {
        id: "scene",
        display_name: "Scene",
        prefix: "scene_",
        category: "Scene",
        filters: &[
            (
                "scene_category",
                "Filter by scene category",
                &["any", "interior", "exterior", "studio", "natural", "urban", "fantasy", "scifi"],
            ),
            (
                "time_hint",
                "Time of day context hint",
                &["any", "day", "night", "dawn", "dusk", "golden_hour", "blue_hour"],
            ),
        ],
    },
    BuiltinSpec {
        id: "background",
        display_name: "Background",
        prefix: "background_",
        category: "Scene",
        filters: &[],
    },
    BuiltinSpec {
        id: "lighting",
        display_name: "Lighting",
        prefix: "lighting_",
        category: "Lighting",
        filters: &[
            (
                "lighting_type",
                "Filter by lighting type",
                &["any", "natural", "studio", "dramatic", "ambient", "neon", "candlelight"],
            ),
            (
                "lighting_mood",
                "Lighting mood hint",
                &["any", "bright", "dark", "moody", "soft", "harsh", "romantic"],
            ),
        ],
    },
    BuiltinSpec {
        id: "composition",
        display_name: "Composition",
        prefix: "composition_",
        category: "Composition",
        filters: &[(
            "composition_style",
            "Filter by composition style",
            &["any", "rule_of_thirds", "centered", "diagonal", "symmetrical", "dynamic", "minimal"],
        )],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_contents() {
        let catalog = GeneratorCatalog::builtin();
        assert_eq!(catalog.len(), 14);

        let dof = catalog.get("camera_dof").unwrap();
        assert_eq!(dof.profile_prefix, "camera_dof_");
        assert_eq!(dof.default_profile, "camera_dof_default.json");
        assert_eq!(dof.category, "Camera");
        assert_eq!(dof.filters[0].default_option(), Some("any"));
        assert!(dof.filters[0].accepts("bokeh_heavy"));
        assert!(!dof.filters[0].accepts("fisheye"));
    }

    #[test]
    fn scene_has_two_filters() {
        let catalog = GeneratorCatalog::builtin();
        let scene = catalog.get("scene").unwrap();
        assert!(scene.filter("scene_category").is_some());
        assert!(scene.filter("time_hint").unwrap().accepts("golden_hour"));
        assert!(scene.filter("lighting_type").is_none());
    }

    #[test]
    fn filter_tooltips() {
        let catalog = GeneratorCatalog::builtin();
        let tooltip = |id: &str, field: &str| catalog.get(id).unwrap().filter(field).unwrap().tooltip.clone();
        assert_eq!(tooltip("lighting", "lighting_type"), "Filter by lighting type");
        assert_eq!(tooltip("scene", "time_hint"), "Time of day context hint");
        assert_eq!(tooltip("composition", "composition_style"), "Filter by composition style");
    }

    #[test]
    fn sorted_iteration_groups_categories() {
        let catalog = GeneratorCatalog::builtin();
        let sorted = catalog.iter_sorted();
        let categories: Vec<&str> = sorted.iter().map(|g| g.category.as_str()).collect();
        let mut expected = categories.clone();
        expected.sort();
        assert_eq!(categories, expected);
    }

    #[test]
    fn ron_catalog_overrides_builtin() {
        let mut catalog = GeneratorCatalog::builtin();
        catalog
            .parse_ron(
                r#"[
                    (
                        id: "style",
                        display_name: "House Style",
                        profile_prefix: "house_style_",
                        default_profile: "house_style_default.json",
                        category: "Style",
                    ),
                    (
                        id: "texture",
                        display_name: "Texture",
                        default_profile: "texture.json",
                        filters: [(name: "grain", options: ["any", "fine", "coarse"])],
                    ),
                ]"#,
            )
            .unwrap();

        assert_eq!(catalog.len(), 15);
        let style = catalog.get("style").unwrap();
        assert_eq!(style.display_name, "House Style");
        assert!(style.filters.is_empty());

        let texture = catalog.get("texture").unwrap();
        assert_eq!(texture.profile_prefix, "");
        assert!(texture.filter("grain").unwrap().accepts("coarse"));
    }

    #[test]
    fn malformed_ron_is_an_error() {
        let mut catalog = GeneratorCatalog::default();
        assert!(matches!(
            catalog.parse_ron("[(id: 3)]"),
            Err(CatalogError::Ron(_))
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn generic_config_defaults() {
        let generic = GeneratorConfig::generic();
        assert_eq!(generic.default_profile, "default.json");
        assert!(generic.profile_prefix.is_empty());
    }
}
