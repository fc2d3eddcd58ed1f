//! WASM bindings for zeroprompt: powers the in-browser profile playground.
//!
//! Profiles cross the boundary as JSON text; structured results go back as
//! JSON strings.

use wasm_bindgen::prelude::*;

use zeroprompt::core::render::{select, BatchOutput, DEFAULT_SEPARATOR};
use zeroprompt::core::service::MAX_BATCH;
use zeroprompt::store::loader::{parse_profile, InMemoryProfiles, ProfileFormat};
use zeroprompt::{Profile, ProfileCache, PromptService, RenderRequest};

// ---------------------------------------------------------------------------
// Shipped profiles, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const SHIPPED: &[(&str, &str)] = &[
        ("default.json", include_str!("../../profiles/default.json")),
        (
            "subject_description_default.json",
            include_str!("../../profiles/subject_description_default.json"),
        ),
        (
            "camera_angle_default.json",
            include_str!("../../profiles/camera_angle_default.json"),
        ),
        ("lighting_default.json", include_str!("../../profiles/lighting_default.json")),
        ("mood_default.json", include_str!("../../profiles/mood_default.json")),
    ];
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct BatchResult {
    joint_text: String,
    indexed_list: String,
    prompts: Vec<String>,
}

#[derive(serde::Serialize)]
struct Explanation<'a> {
    template_index: usize,
    template: &'a str,
    components: Vec<Component<'a>>,
    text: String,
}

#[derive(serde::Serialize)]
struct Component<'a> {
    pool: &'a str,
    index: usize,
    value: &'a str,
}

fn load_json(profile_json: &str) -> Result<Profile, JsError> {
    parse_profile("<input>", profile_json, Some(ProfileFormat::Json))
        .map_err(|e| JsError::new(&format!("Profile error: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn batch_result(seed: u32, start_index: u32, count: u32, separator: &str, profile: &Profile) -> BatchResult {
    let count = count.clamp(1, MAX_BATCH);
    let results = zeroprompt::render_batch(seed, start_index, count, profile);
    let BatchOutput {
        joint_text,
        indexed_list,
    } = BatchOutput::from_results(&results, separator);
    BatchResult {
        joint_text,
        indexed_list,
        prompts: results.into_iter().map(|(_, text)| text).collect(),
    }
}

// ---------------------------------------------------------------------------
// Stateless exports
// ---------------------------------------------------------------------------

/// Render the prompt at `position_index` for a profile given as JSON text.
#[wasm_bindgen]
pub fn render(seed: u32, position_index: u32, profile_json: &str) -> Result<String, JsError> {
    let profile = load_json(profile_json)?;
    Ok(zeroprompt::render(seed, position_index, &profile))
}

/// Render a run of prompts. Returns JSON with `joint_text`, `indexed_list`
/// and `prompts`. An empty `separator` means the default.
#[wasm_bindgen]
pub fn render_batch(
    seed: u32,
    start_index: u32,
    count: u32,
    profile_json: &str,
    separator: &str,
) -> Result<String, JsError> {
    let profile = load_json(profile_json)?;
    let separator = if separator.is_empty() {
        DEFAULT_SEPARATOR
    } else {
        separator
    };
    to_json(&batch_result(seed, start_index, count, separator, &profile))
}

/// Combine up to four seeds; missing trailing seeds count as zero.
#[wasm_bindgen]
pub fn mix_seeds(seed1: u32, seed2: u32, seed3: u32, seed4: u32) -> u32 {
    zeroprompt::mix_seeds(&[seed1, seed2, seed3, seed4])
}

/// The raw coordinate hash, for checking results against other hosts.
#[wasm_bindgen]
pub fn prompt_hash(seed: u32, coords: &[i32]) -> u32 {
    zeroprompt::prompt_hash(u64::from(seed), coords)
}

/// Profile statistics as JSON.
#[wasm_bindgen]
pub fn profile_info(profile_json: &str) -> Result<String, JsError> {
    let profile = load_json(profile_json)?;
    to_json(&profile.summary("<input>"))
}

// ---------------------------------------------------------------------------
// Playground session over the shipped profiles
// ---------------------------------------------------------------------------

#[wasm_bindgen]
pub struct PromptDemo {
    service: PromptService,
    cache: ProfileCache,
    profile: String,
    seed: u32,
    /// Ids added through `load_profile`, in load order.
    loaded: Vec<String>,
}

#[wasm_bindgen]
impl PromptDemo {
    /// Create a session for a built-in generator (e.g. "mood"), or the
    /// generic generator when `generator_id` is empty.
    #[wasm_bindgen(constructor)]
    pub fn new(generator_id: &str, seed: u32) -> Result<PromptDemo, JsError> {
        let mut profiles = InMemoryProfiles::new();
        for (name, contents) in data::SHIPPED {
            profiles
                .insert_source(name, contents)
                .map_err(|e| JsError::new(&format!("Shipped profile error: {e}")))?;
        }

        let mut builder = PromptService::builder().with_profiles(profiles);
        if !generator_id.is_empty() {
            builder = builder.generator_id(generator_id);
        }
        let service = builder
            .build()
            .map_err(|e| JsError::new(&format!("Service build error: {e}")))?;
        let profile = service.config().default_profile.clone();

        Ok(PromptDemo {
            service,
            cache: ProfileCache::new(),
            profile,
            seed,
            loaded: Vec::new(),
        })
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
    }

    pub fn set_profile(&mut self, profile_id: &str) {
        self.profile = profile_id.to_string();
    }

    /// Add or replace a profile from JSON text and make it current. The id
    /// is listed by `profiles()` from then on.
    pub fn load_profile(&mut self, profile_id: &str, profile_json: &str) -> Result<(), JsError> {
        let profile = load_json(profile_json)?;
        self.cache.insert(profile_id, profile);
        if !self.loaded.iter().any(|id| id == profile_id) {
            self.loaded.push(profile_id.to_string());
        }
        self.profile = profile_id.to_string();
        Ok(())
    }

    /// Render at `position_index`. Load failures come back as message text.
    pub fn generate(&mut self, position_index: u32) -> String {
        let request = RenderRequest::new(self.seed, position_index).profile(self.profile.as_str());
        self.service.generate_or_message(&mut self.cache, &request)
    }

    /// Same shape as the stateless `render_batch`.
    pub fn generate_batch(&mut self, start_index: u32, count: u32) -> Result<String, JsError> {
        let profile = self.current()?;
        to_json(&batch_result(self.seed, start_index, count, DEFAULT_SEPARATOR, &profile))
    }

    /// Which template and pool items produced the prompt at `position_index`.
    pub fn explain(&mut self, position_index: u32) -> Result<String, JsError> {
        let profile = self.current()?;
        let selection = select(self.seed, position_index, &profile);
        let explanation = Explanation {
            template_index: selection.template_index,
            template: selection.template.source(),
            components: selection
                .components
                .iter()
                .map(|(pool, (index, value))| Component {
                    pool: *pool,
                    index: *index,
                    value: *value,
                })
                .collect(),
            text: selection.fill(),
        };
        to_json(&explanation)
    }

    pub fn info(&mut self) -> Result<String, JsError> {
        let profile = self.current()?;
        to_json(&profile.summary(&self.profile))
    }

    /// JSON array of profiles visible to this session's generator, followed
    /// by profiles loaded into the session.
    pub fn profiles(&self) -> String {
        let ids = session_profiles(self.service.discover(), &self.loaded);
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }
}

fn session_profiles(mut discovered: Vec<String>, loaded: &[String]) -> Vec<String> {
    for id in loaded {
        if !discovered.contains(id) {
            discovered.push(id.clone());
        }
    }
    discovered
}

// Private helpers
impl PromptDemo {
    fn current(&mut self) -> Result<std::sync::Arc<Profile>, JsError> {
        if let Some(profile) = self.cache.get(&self.profile) {
            return Ok(profile);
        }
        let request = RenderRequest::new(self.seed, 0).profile(self.profile.as_str());
        self.service
            .generate(&mut self.cache, &request)
            .map_err(|e| JsError::new(&format!("Profile error: {e}")))?;
        self.cache
            .get(&self.profile)
            .ok_or_else(|| JsError::new(&format!("Profile '{}' is not loaded", self.profile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_profiles_follow_discovered_ones() {
        let discovered = vec!["mood_default.json".to_string()];
        let loaded = vec!["mine.json".to_string(), "mood_default.json".to_string()];
        assert_eq!(
            session_profiles(discovered, &loaded),
            vec!["mood_default.json", "mine.json"]
        );
    }

    #[test]
    fn session_lists_profile_added_at_runtime() {
        let Ok(mut demo) = PromptDemo::new("mood", 1) else {
            panic!("mood session failed to build");
        };
        let loaded = demo.load_profile("mine.json", r#"{"templates": ["only {x}"], "pools": {"x": ["me"]}}"#);
        assert!(loaded.is_ok());
        let ids: Vec<String> = serde_json::from_str(&demo.profiles()).unwrap();
        assert_eq!(ids, vec!["mood_default.json", "mine.json"]);
        assert_eq!(demo.generate(3), "only me");
    }

    #[test]
    fn shipped_profiles_parse() {
        for (name, contents) in data::SHIPPED {
            assert!(parse_profile(name, contents, None).is_ok(), "{} failed to parse", name);
        }
    }
}
