//! Prompt rendering: coordinate → template + pool items → text.
//!
//! Rendering is a pure function of `(seed, position_index, profile)`. Each
//! choice is hashed independently from its own coordinate, so any index can
//! be rendered without rendering the ones before it.

use indexmap::IndexMap;

use crate::core::hash::{index_of, prompt_hash, TEMPLATE_ORDINAL};
use crate::core::template::Template;
use crate::schema::profile::Profile;

/// Separator placed between renders in a joined batch.
pub const DEFAULT_SEPARATOR: &str = "\n---\n";

/// The choices made for one coordinate, before slot filling.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'p> {
    pub template_index: usize,
    pub template: &'p Template,
    /// Pool name → (item index, item), in pool ordinal order.
    pub components: IndexMap<&'p str, (usize, &'p str)>,
}

impl Selection<'_> {
    /// Fill the selected template with the selected items.
    pub fn fill(&self) -> String {
        self.template
            .fill(|slot| self.components.get(slot).map(|&(_, item)| item))
    }
}

/// Make every choice for `(seed, position_index)` without filling slots.
pub fn select(seed: u32, position_index: u32, profile: &Profile) -> Selection<'_> {
    let seed = u64::from(seed);
    let index = position_index as i32;
    let templates = profile.templates();

    let template_hash = prompt_hash(seed, &[index, TEMPLATE_ORDINAL]);
    let template_index = index_of(template_hash, templates.len() as u32);

    let mut components = IndexMap::with_capacity(profile.pools().len());
    for (ordinal, (pool_name, pool)) in (1i32..).zip(profile.pools()) {
        let component_hash = prompt_hash(seed, &[index, ordinal]);
        let item_index = index_of(component_hash, pool.len() as u32);
        components.insert(pool_name.as_str(), (item_index, pool[item_index].as_str()));
    }

    Selection {
        template_index,
        template: &templates[template_index],
        components,
    }
}

/// Render the prompt at `position_index` for `seed`.
///
/// Slots naming no pool render as `[name]`; pools the template never
/// mentions are still selected and simply unused.
pub fn render(seed: u32, position_index: u32, profile: &Profile) -> String {
    select(seed, position_index, profile).fill()
}

/// Render `count` consecutive indices starting at `start_index`.
///
/// Indices wrap around at `u32::MAX`.
pub fn render_batch(
    seed: u32,
    start_index: u32,
    count: u32,
    profile: &Profile,
) -> Vec<(u32, String)> {
    (0..count)
        .map(|offset| {
            let index = start_index.wrapping_add(offset);
            (index, render(seed, index, profile))
        })
        .collect()
}

/// A batch formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    /// Every render joined by the separator.
    pub joint_text: String,
    /// One line per render: `[offset] text`, offsets counted from zero.
    pub indexed_list: String,
}

impl BatchOutput {
    pub fn from_results(results: &[(u32, String)], separator: &str) -> BatchOutput {
        let joint_text = results
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join(separator);
        let indexed_list = results
            .iter()
            .enumerate()
            .map(|(offset, (_, text))| format!("[{}] {}", offset, text))
            .collect::<Vec<_>>()
            .join("\n");
        BatchOutput {
            joint_text,
            indexed_list,
        }
    }
}
