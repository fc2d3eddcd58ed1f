//! Prompt templates: slot parsing and filling.

use serde::{Serialize, Serializer};

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A named slot: `{subject}`.
    Slot(String),
}

/// A parsed template. Keeps its source text for display and serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{name}` → `Slot`, where the braces hold no other brace
    /// - `{{` / `}}` → literal `{` / `}`
    /// - Everything else, including unmatched braces → `Literal`
    ///
    /// Parsing never fails; anything that is not a slot stays literal text.
    pub fn parse(input: &str) -> Template {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            match chars[i] {
                '{' if i + 1 < len && chars[i + 1] == '{' => {
                    literal_buf.push('{');
                    i += 2;
                }
                '}' if i + 1 < len && chars[i + 1] == '}' => {
                    literal_buf.push('}');
                    i += 2;
                }
                '{' => {
                    let start = i + 1;
                    let close = chars[start..]
                        .iter()
                        .position(|&c| c == '{' || c == '}')
                        .map(|offset| start + offset)
                        .filter(|&end| chars[end] == '}' && end > start);

                    match close {
                        Some(end) => {
                            if !literal_buf.is_empty() {
                                segments.push(TemplateSegment::Literal(std::mem::take(
                                    &mut literal_buf,
                                )));
                            }
                            segments.push(TemplateSegment::Slot(chars[start..end].iter().collect()));
                            i = end + 1;
                        }
                        None => {
                            literal_buf.push('{');
                            i += 1;
                        }
                    }
                }
                c => {
                    literal_buf.push(c);
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Template {
            source: input.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Names of all slots in order of appearance, duplicates included.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Slot(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Fill every slot using `lookup`.
    ///
    /// A slot that `lookup` cannot resolve becomes `[name]` when its name is
    /// an identifier, and is reproduced verbatim as `{name}` otherwise.
    /// Substituted values are inserted as-is and never re-parsed.
    pub fn fill<'v, F>(&self, mut lookup: F) -> String
    where
        F: FnMut(&str) -> Option<&'v str>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Slot(name) => match lookup(name) {
                    Some(value) => out.push_str(value),
                    None if is_slot_name(name) => {
                        out.push('[');
                        out.push_str(name);
                        out.push(']');
                    }
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Whether `name` looks like a slot an author meant to fill:
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_slot_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
