//! Validation rule sets.
//!
//! A [`RuleSet`] maps field names to the constraints that apply to them. Rules
//! are written either as one pipe-separated string (`"required|string|max:255"`)
//! or as a list of rule strings, which is the only way to use a `regex:`
//! pattern that contains `|`.

use crate::validation;

/// Ordered mapping from field name to its rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    fields: Vec<(String, Vec<String>)>,
}

/// Anything that can be turned into a list of rule strings.
pub trait IntoRules {
    fn into_rules(self) -> Vec<String>;
}

impl IntoRules for &str {
    fn into_rules(self) -> Vec<String> {
        self.split('|')
            .map(str::trim)
            .filter(|rule| !rule.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl IntoRules for String {
    fn into_rules(self) -> Vec<String> {
        self.as_str().into_rules()
    }
}

impl IntoRules for Vec<String> {
    fn into_rules(self) -> Vec<String> {
        self
    }
}

impl IntoRules for Vec<&str> {
    fn into_rules(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl<const N: usize> IntoRules for [&str; N] {
    fn into_rules(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RuleSet::insert`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, rules: impl IntoRules) -> Self {
        self.insert(field, rules);
        self
    }

    /// Set the rules for `field`, replacing any previous entry in place.
    pub fn insert(&mut self, field: impl Into<String>, rules: impl IntoRules) {
        let field = field.into();
        let rules = rules.into_rules();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = rules,
            None => self.fields.push((field, rules)),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rules)| rules.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `self` overlaid with `overrides`; fields present in both take the
    /// override's rules.
    #[must_use]
    pub fn merged_with(&self, overrides: &RuleSet) -> RuleSet {
        let mut merged = self.clone();
        for (field, rules) in &overrides.fields {
            merged.insert(field.clone(), rules.clone());
        }
        merged
    }
}

impl<F: Into<String>, R: IntoRules> FromIterator<(F, R)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (F, R)>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for (field, rules) in iter {
            set.insert(field, rules);
        }
        set
    }
}

impl<F: Into<String>, R: IntoRules, const N: usize> From<[(F, R); N]> for RuleSet {
    fn from(entries: [(F, R); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// The create and update rules of one controller.
///
/// Update rules start as a copy of the create rules; explicitly supplied update
/// rules replace the create rules of the same field. The merge happens once,
/// here, together with compiling any `regex:` patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSets {
    create: RuleSet,
    update: RuleSet,
}

impl RuleSets {
    #[must_use]
    pub fn new(create: RuleSet, update: RuleSet) -> Self {
        let update = create.merged_with(&update);
        validation::compile_patterns(&create);
        validation::compile_patterns(&update);
        Self { create, update }
    }

    /// Same rules for create and update.
    #[must_use]
    pub fn shared(create: RuleSet) -> Self {
        Self::new(create, RuleSet::new())
    }

    #[must_use]
    pub fn create(&self) -> &RuleSet {
        &self.create
    }

    #[must_use]
    pub fn update(&self) -> &RuleSet {
        &self.update
    }
}
