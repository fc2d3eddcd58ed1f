//! Zeroprompt: deterministic position-as-seed prompt generation.
//!
//! A `(seed, position_index, profile)` triple always renders the same text.
//! Every choice is an XXH32 hash of its coordinate, so the space of prompts
//! can be enumerated index by index without storing anything.

pub mod core;
pub mod schema;
pub mod store;

pub use crate::core::hash::{change_token, index_of, mix_seeds, prompt_hash};
pub use crate::core::render::{render, render_batch, BatchOutput};
pub use crate::core::service::{BatchRequest, PromptService, RenderRequest};
pub use crate::schema::profile::{Profile, ValidationError};
pub use crate::store::cache::ProfileCache;
pub use crate::store::loader::{ProfileDir, ProfileError, ProfileSource};
