//! The generation service: request → profile lookup → render.
//!
//! One `PromptService` per generator configuration. The service owns its
//! profile source but not the cache; hosts pass a `ProfileCache` they own,
//! so cache lifetime is theirs to decide.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::hash;
use crate::core::render::{self, BatchOutput, DEFAULT_SEPARATOR};
use crate::schema::generator::{CatalogError, GeneratorCatalog, GeneratorConfig};
use crate::schema::profile::ProfileSummary;
use crate::store::cache::ProfileCache;
use crate::store::loader::{InMemoryProfiles, ProfileDir, ProfileError, ProfileSource};

/// Largest batch a single request may produce.
pub const MAX_BATCH: u32 = 100;

/// Directory profiles are read from when none is configured.
pub const DEFAULT_PROFILES_DIR: &str = "profiles";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("generator catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("unknown generator: {0}")]
    UnknownGenerator(String),
}

/// One generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    pub seed: u32,
    pub position_index: u32,
    /// Profile identifier; the generator's default when `None`.
    pub profile: Option<String>,
    pub prefix: String,
    pub suffix: String,
    /// Filter hints by field name. Checked against the generator's declared
    /// options and logged; they do not change the output.
    pub filters: BTreeMap<String, String>,
}

impl RenderRequest {
    pub fn new(seed: u32, position_index: u32) -> Self {
        Self {
            seed,
            position_index,
            ..Self::default()
        }
    }

    pub fn profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile = Some(profile_id.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }
}

/// A request for `count` consecutive renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub seed: u32,
    pub start_index: u32,
    /// Clamped to `1..=MAX_BATCH`.
    pub count: u32,
    pub profile: Option<String>,
    /// The service's separator when `None`.
    pub separator: Option<String>,
}

impl BatchRequest {
    pub fn new(seed: u32, start_index: u32, count: u32) -> Self {
        Self {
            seed,
            start_index,
            count,
            profile: None,
            separator: None,
        }
    }

    pub fn profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile = Some(profile_id.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

/// Renders prompts for one generator configuration. Built via
/// `PromptService::builder()`.
pub struct PromptService {
    config: GeneratorConfig,
    source: Box<dyn ProfileSource + Send + Sync>,
    separator: String,
}

/// Builder for constructing a `PromptService`.
pub struct PromptServiceBuilder {
    generator: Option<GeneratorConfig>,
    generator_id: Option<String>,
    catalog_path: Option<PathBuf>,
    profiles_dir: Option<PathBuf>,
    separator: String,
    /// Directly provided profile source (for testing without files).
    source: Option<Box<dyn ProfileSource + Send + Sync>>,
}

impl PromptService {
    pub fn builder() -> PromptServiceBuilder {
        PromptServiceBuilder {
            generator: None,
            generator_id: None,
            catalog_path: None,
            profiles_dir: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            source: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Profile identifiers available to this generator, default first.
    pub fn discover(&self) -> Vec<String> {
        self.source.discover(&self.config.profile_prefix)
    }

    fn profile_id<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.config.default_profile)
    }

    /// Render one prompt, wrapped in the request's prefix and suffix.
    pub fn generate(
        &self,
        cache: &mut ProfileCache,
        request: &RenderRequest,
    ) -> Result<String, ProfileError> {
        let profile_id = self.profile_id(request.profile.as_deref());
        self.check_filters(&request.filters);

        let profile = cache.get_or_load(self.source.as_ref(), profile_id)?;
        let text = render::render(request.seed, request.position_index, &profile);

        if request.prefix.is_empty() && request.suffix.is_empty() {
            Ok(text)
        } else {
            Ok(format!("{}{}{}", request.prefix, text, request.suffix))
        }
    }

    /// Like `generate`, but a profile failure becomes the returned text.
    pub fn generate_or_message(&self, cache: &mut ProfileCache, request: &RenderRequest) -> String {
        self.generate(cache, request).unwrap_or_else(|e| {
            let profile_id = self.profile_id(request.profile.as_deref());
            warn!(profile = profile_id, error = %e, "generation failed");
            format!("[Error loading profile '{}': {}]", profile_id, e)
        })
    }

    /// Fingerprint for deciding whether a previous `generate` result for
    /// this request can be reused. Prefix and suffix are not included.
    pub fn change_token(&self, request: &RenderRequest) -> u32 {
        let profile_id = self.profile_id(request.profile.as_deref());
        hash::change_token(request.seed, request.position_index, profile_id)
    }

    /// Render a run of consecutive indices.
    pub fn batch(
        &self,
        cache: &mut ProfileCache,
        request: &BatchRequest,
    ) -> Result<BatchOutput, ProfileError> {
        let profile_id = self.profile_id(request.profile.as_deref());
        let count = clamp_batch_count(request.count);
        let profile = cache.get_or_load(self.source.as_ref(), profile_id)?;

        let results = render::render_batch(request.seed, request.start_index, count, &profile);
        let separator = request.separator.as_deref().unwrap_or(&self.separator);
        Ok(BatchOutput::from_results(&results, separator))
    }

    pub fn batch_change_token(&self, request: &BatchRequest) -> u32 {
        let profile_id = self.profile_id(request.profile.as_deref());
        hash::batch_change_token(
            request.seed,
            request.start_index,
            clamp_batch_count(request.count),
            profile_id,
        )
    }

    /// Statistics for a profile. Always reads the source, bypassing any
    /// cache, so edits show up immediately.
    pub fn profile_info(&self, profile_id: Option<&str>) -> Result<ProfileSummary, ProfileError> {
        let profile_id = self.profile_id(profile_id);
        let profile = self.source.load(profile_id)?;
        Ok(profile.summary(profile_id))
    }

    fn check_filters(&self, filters: &BTreeMap<String, String>) {
        for (field, value) in filters {
            match self.config.filter(field) {
                Some(declared) if declared.accepts(value) => {
                    debug!(generator = %self.config.id, field = %field, value = %value, "filter hint");
                }
                Some(_) => {
                    warn!(generator = %self.config.id, field = %field, value = %value, "unsupported filter option");
                }
                None => {
                    warn!(generator = %self.config.id, field = %field, "unknown filter field");
                }
            }
        }
    }
}

fn clamp_batch_count(count: u32) -> u32 {
    let clamped = count.clamp(1, MAX_BATCH);
    if clamped != count {
        warn!(requested = count, used = clamped, "batch count out of range");
    }
    clamped
}

impl PromptServiceBuilder {
    /// Use this generator configuration.
    pub fn generator(mut self, config: GeneratorConfig) -> Self {
        self.generator = Some(config);
        self
    }

    /// Look up the generator by id in the catalog at build time.
    pub fn generator_id(mut self, id: &str) -> Self {
        self.generator_id = Some(id.to_string());
        self
    }

    /// RON file of extra generator configurations, merged over the built-in ones.
    pub fn catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn profiles_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.profiles_dir = Some(path.into());
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Provide a profile source directly (for testing without files).
    pub fn with_source<S>(mut self, source: S) -> Self
    where
        S: ProfileSource + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Provide in-memory profiles directly (for testing without files).
    pub fn with_profiles(self, profiles: InMemoryProfiles) -> Self {
        self.with_source(profiles)
    }

    pub fn build(self) -> Result<PromptService, ServiceError> {
        let config = match (self.generator, self.generator_id) {
            (Some(config), _) => config,
            (None, Some(id)) => {
                let mut catalog = GeneratorCatalog::builtin();
                if let Some(ref path) = self.catalog_path {
                    catalog.load_from_ron(path)?;
                }
                catalog
                    .get(&id)
                    .cloned()
                    .ok_or(ServiceError::UnknownGenerator(id))?
            }
            (None, None) => GeneratorConfig::generic(),
        };

        let source = match self.source {
            Some(source) => source,
            None => {
                let dir = self
                    .profiles_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILES_DIR));
                Box::new(ProfileDir::new(dir)) as Box<dyn ProfileSource + Send + Sync>
            }
        };

        debug!(generator = %config.id, "prompt service ready");
        Ok(PromptService {
            config,
            source,
            separator: self.separator,
        })
    }
}
