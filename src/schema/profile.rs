//! Vocabulary profiles: validation, combinatorics, and summary reports.

use indexmap::IndexMap;
use num_bigint::BigUint;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::core::template::Template;

/// Structural problems found while validating a raw profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("profile root must be a mapping")]
    NotAMapping,
    #[error("missing '{0}' field")]
    MissingField(&'static str),
    #[error("'{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("'templates' must contain at least one template")]
    EmptyTemplates,
    #[error("pool '{0}' must contain at least one entry")]
    EmptyPool(String),
}

/// A validated, immutable vocabulary bank.
///
/// Fields are private so that every `Profile` in circulation has passed
/// validation: at least one template and no empty pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    templates: Vec<Template>,
    pools: IndexMap<String, Vec<String>>,
}

impl Profile {
    /// Validate a parsed structured record into a `Profile`.
    ///
    /// Requires `templates` (non-empty sequence of strings) and `pools`
    /// (mapping of names to non-empty sequences of strings). Pool order is
    /// the record's key order. `name`, `description` and `version` are
    /// optional; strings and numbers are accepted for them.
    pub fn validate(raw: &Value) -> Result<Profile, ValidationError> {
        let root = raw.as_object().ok_or(ValidationError::NotAMapping)?;

        let raw_templates = root
            .get("templates")
            .ok_or(ValidationError::MissingField("templates"))?;
        let raw_pools = root
            .get("pools")
            .ok_or(ValidationError::MissingField("pools"))?;

        let templates = string_list(raw_templates, "templates")?;
        if templates.is_empty() {
            return Err(ValidationError::EmptyTemplates);
        }

        let pool_map = raw_pools.as_object().ok_or_else(|| ValidationError::WrongType {
            field: "pools".to_string(),
            expected: "a mapping of pool names to string lists",
        })?;

        let mut pools = IndexMap::with_capacity(pool_map.len());
        for (pool_name, entries) in pool_map {
            let entries = string_list(entries, &format!("pools.{}", pool_name))?;
            if entries.is_empty() {
                return Err(ValidationError::EmptyPool(pool_name.clone()));
            }
            pools.insert(pool_name.clone(), entries);
        }

        Ok(Profile {
            name: metadata(root.get("name")),
            description: metadata(root.get("description")),
            version: metadata(root.get("version")),
            templates: templates.iter().map(|t| Template::parse(t)).collect(),
            pools,
        })
    }

    /// Build a profile directly from templates and ordered pools.
    pub fn new(
        templates: Vec<String>,
        pools: IndexMap<String, Vec<String>>,
    ) -> Result<Profile, ValidationError> {
        if templates.is_empty() {
            return Err(ValidationError::EmptyTemplates);
        }
        if let Some((name, _)) = pools.iter().find(|(_, entries)| entries.is_empty()) {
            return Err(ValidationError::EmptyPool(name.clone()));
        }
        Ok(Profile {
            name: None,
            description: None,
            version: None,
            templates: templates.iter().map(|t| Template::parse(t)).collect(),
            pools,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Pools in ordinal order: the first pool has ordinal 1.
    pub fn pools(&self) -> &IndexMap<String, Vec<String>> {
        &self.pools
    }

    /// Number of distinct (template, pool item...) selections.
    ///
    /// Equals the template count when there are no pools.
    pub fn total_combinations(&self) -> BigUint {
        self.pools
            .values()
            .fold(BigUint::from(self.templates.len()), |acc, pool| {
                acc * BigUint::from(pool.len())
            })
    }

    /// Summary report for this profile, titled with its name or `fallback_name`.
    pub fn summary(&self, fallback_name: &str) -> ProfileSummary {
        ProfileSummary {
            title: self.name.clone().unwrap_or_else(|| fallback_name.to_string()),
            description: self.description.clone(),
            version: self.version.clone(),
            pool_sizes: self
                .pools
                .iter()
                .map(|(name, entries)| (name.clone(), entries.len()))
                .collect(),
            template_count: self.templates.len(),
            total_combinations: self.total_combinations(),
        }
    }
}

fn string_list(value: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    let wrong_type = || ValidationError::WrongType {
        field: field.to_string(),
        expected: "a sequence of strings",
    };
    value
        .as_array()
        .ok_or_else(wrong_type)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
        .collect()
}

fn metadata(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Statistics about a profile, printable as a human-readable report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub title: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub pool_sizes: Vec<(String, usize)>,
    pub template_count: usize,
    #[serde(serialize_with = "serialize_decimal")]
    pub total_combinations: BigUint,
}

fn serialize_decimal<S: serde::Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

impl fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Profile: {}", self.title)?;
        writeln!(f, "Description: {}", self.description.as_deref().unwrap_or("N/A"))?;
        writeln!(f, "Version: {}", self.version.as_deref().unwrap_or("N/A"))?;
        writeln!(f)?;
        writeln!(f, "Pool Sizes:")?;
        for (name, size) in &self.pool_sizes {
            writeln!(f, "  {}: {} entries", name, size)?;
        }
        writeln!(f, "  templates: {} variations", self.template_count)?;
        writeln!(f)?;
        writeln!(
            f,
            "Total unique prompts: {}",
            group_thousands(&self.total_combinations)
        )?;
        write!(
            f,
            "Scientific notation: {}",
            scientific(&self.total_combinations)
        )
    }
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: &BigUint) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Three significant digits, exponent signed and at least two digits wide:
/// `6` → `"6.00e+00"`, `123456` → `"1.23e+05"`. Rounds the exact value
/// half to even, so `1225` → `"1.22e+03"` and `1235` → `"1.24e+03"`.
pub fn scientific(value: &BigUint) -> String {
    let digits: Vec<u32> = value
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.iter().all(|&d| d == 0) {
        return "0.00e+00".to_string();
    }

    let mut exponent = digits.len() - 1;
    let digit_at = |i: usize| digits.get(i).copied().unwrap_or(0);
    let mut mantissa = digit_at(0) * 100 + digit_at(1) * 10 + digit_at(2);

    let dropped = digits.get(3..).unwrap_or(&[]);
    let round_up = match dropped.split_first() {
        Some((&first, rest)) => {
            let beyond_half = rest.iter().any(|&d| d != 0);
            first > 5 || (first == 5 && (beyond_half || mantissa % 2 == 1))
        }
        None => false,
    };
    if round_up {
        mantissa += 1;
    }
    if mantissa == 1000 {
        mantissa = 100;
        exponent += 1;
    }
    format!(
        "{}.{:02}e+{:02}",
        mantissa / 100,
        mantissa % 100,
        exponent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_minimal_profile() {
        let p = Profile::validate(&json!({
            "templates": ["a {x}"],
            "pools": {"x": ["1", "2"]}
        }))
        .unwrap();
        assert_eq!(p.templates().len(), 1);
        assert_eq!(p.pools()["x"], vec!["1".to_string(), "2".to_string()]);
        assert!(p.name().is_none());
    }

    #[test]
    fn validate_keeps_pool_order() {
        let p = Profile::validate(&json!({
            "templates": ["t"],
            "pools": {"zeta": ["z"], "alpha": ["a"], "mid": ["m"]}
        }))
        .unwrap();
        let names: Vec<&str> = p.pools().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn validate_empty_pools_mapping_is_fine() {
        let p = Profile::validate(&json!({"templates": ["only text"], "pools": {}})).unwrap();
        assert!(p.pools().is_empty());
    }

    #[test]
    fn validate_reads_metadata() {
        let p = Profile::validate(&json!({
            "name": "Portraits",
            "description": "faces",
            "version": 2,
            "templates": ["t"],
            "pools": {}
        }))
        .unwrap();
        assert_eq!(p.name(), Some("Portraits"));
        assert_eq!(p.description(), Some("faces"));
        assert_eq!(p.version(), Some("2"));
    }

    #[test]
    fn reject_missing_templates() {
        let err = Profile::validate(&json!({"pools": {}})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("templates"));
    }

    #[test]
    fn reject_missing_pools() {
        let err = Profile::validate(&json!({"templates": ["t"]})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("pools"));
    }

    #[test]
    fn reject_empty_templates() {
        let err = Profile::validate(&json!({"templates": [], "pools": {}})).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTemplates);
    }

    #[test]
    fn reject_empty_pool() {
        let err = Profile::validate(&json!({
            "templates": ["t"],
            "pools": {"a": ["x"], "b": []}
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyPool("b".to_string()));
    }

    #[test]
    fn reject_non_string_entries() {
        let err = Profile::validate(&json!({
            "templates": ["t"],
            "pools": {"a": ["x", 3]}
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { ref field, .. } if field == "pools.a"));
    }

    #[test]
    fn reject_pools_as_list() {
        let err = Profile::validate(&json!({"templates": ["t"], "pools": []})).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { ref field, .. } if field == "pools"));
    }

    #[test]
    fn reject_non_mapping_root() {
        assert_eq!(
            Profile::validate(&json!(["t"])).unwrap_err(),
            ValidationError::NotAMapping
        );
    }

    #[test]
    fn new_rejects_empty_pool() {
        let pools = IndexMap::from([("a".to_string(), vec![])]);
        assert_eq!(
            Profile::new(vec!["t".to_string()], pools).unwrap_err(),
            ValidationError::EmptyPool("a".to_string())
        );
    }

    #[test]
    fn combinations_multiply() {
        let p = Profile::validate(&json!({
            "templates": ["t1", "t2"],
            "pools": {"a": ["x", "y", "z"]}
        }))
        .unwrap();
        assert_eq!(p.total_combinations(), BigUint::from(6u32));
    }

    #[test]
    fn combinations_without_pools_count_templates() {
        let p = Profile::validate(&json!({"templates": ["a", "b", "c"], "pools": {}})).unwrap();
        assert_eq!(p.total_combinations(), BigUint::from(3u32));
    }

    #[test]
    fn combinations_exceed_u64() {
        let pool: Vec<String> = (0..1000).map(|i| i.to_string()).collect();
        let pools: IndexMap<String, Vec<String>> = (0..8)
            .map(|i| (format!("p{}", i), pool.clone()))
            .collect();
        let p = Profile::new(vec!["t".to_string()], pools).unwrap();
        // 1000^8 = 10^24
        assert_eq!(p.total_combinations().to_string(), format!("1{}", "0".repeat(24)));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(&BigUint::from(0u32)), "0");
        assert_eq!(group_thousands(&BigUint::from(999u32)), "999");
        assert_eq!(group_thousands(&BigUint::from(1000u32)), "1,000");
        assert_eq!(group_thousands(&BigUint::from(1234567u32)), "1,234,567");
    }

    #[test]
    fn scientific_formatting() {
        assert_eq!(scientific(&BigUint::from(0u32)), "0.00e+00");
        assert_eq!(scientific(&BigUint::from(6u32)), "6.00e+00");
        assert_eq!(scientific(&BigUint::from(123456u32)), "1.23e+05");
        assert_eq!(scientific(&BigUint::from(1235u32)), "1.24e+03");
        assert_eq!(scientific(&BigUint::from(99960u32)), "1.00e+05");
    }

    #[test]
    fn scientific_ties_round_to_even() {
        assert_eq!(scientific(&BigUint::from(1225u32)), "1.22e+03");
        assert_eq!(scientific(&BigUint::from(12250u32)), "1.22e+04");
        assert_eq!(scientific(&BigUint::from(12251u32)), "1.23e+04");
        assert_eq!(scientific(&BigUint::from(1235u32)), "1.24e+03");
        assert_eq!(scientific(&BigUint::from(99950u32)), "1.00e+05");
    }

    #[test]
    fn report_uses_tie_rounding() {
        // 5 templates * 5 * 7 * 7 = 1225
        let pool = |n: usize| -> Vec<String> { (0..n).map(|i| i.to_string()).collect() };
        let pools: IndexMap<String, Vec<String>> = [("a", 5), ("b", 7), ("c", 7)]
            .into_iter()
            .map(|(name, n)| (name.to_string(), pool(n)))
            .collect();
        let templates = (0..5).map(|i| format!("t{}", i)).collect();
        let report = Profile::new(templates, pools).unwrap().summary("p.json").to_string();
        assert!(report.ends_with("Total unique prompts: 1,225\nScientific notation: 1.22e+03"), "{}", report);
    }

    #[test]
    fn summary_report_layout() {
        let p = Profile::validate(&json!({
            "name": "Demo",
            "templates": ["t1", "t2"],
            "pools": {"a": ["x", "y", "z"]}
        }))
        .unwrap();
        let report = p.summary("demo.json").to_string();
        let expected = "Profile: Demo\n\
                        Description: N/A\n\
                        Version: N/A\n\
                        \n\
                        Pool Sizes:\n\
                        \x20 a: 3 entries\n\
                        \x20 templates: 2 variations\n\
                        \n\
                        Total unique prompts: 6\n\
                        Scientific notation: 6.00e+00";
        assert_eq!(report, expected);
    }

    #[test]
    fn summary_falls_back_to_identifier() {
        let p = Profile::new(vec!["t".to_string()], IndexMap::new()).unwrap();
        assert_eq!(p.summary("style_default.json").title, "style_default.json");
    }
}
