//! Validation of submitted fields against a [`RuleSet`].
//!
//! The controller talks to validation through the [`Validator`] trait so an
//! application can plug in its own engine. [`RuleValidator`] is the default
//! and understands the rule vocabulary below.
//!
//! | Rule | Passes when |
//! |---|---|
//! | `required` | the field is present and not null, blank or an empty array |
//! | `present` | the field is present (any value) |
//! | `filled` | the field is absent, or present and not empty |
//! | `nullable` | `null` is accepted and skips the remaining rules |
//! | `sometimes` | rules only apply when the field is present |
//! | `string`, `integer`, `numeric`, `boolean`, `array` | the value has that type |
//! | `email`, `uuid` | the string is an email address / UUID |
//! | `min:n`, `max:n`, `between:a,b`, `size:n` | the value's size is in range |
//! | `in:a,b,...`, `not_in:a,b,...` | the value is (not) one of the listed values |
//! | `regex:pattern` | the string matches `pattern` (`/.../` delimiters allowed) |
//!
//! The size of a number is its value, of a string its character count (or its
//! value when the field is also `numeric` or `integer`), of an array its
//! length. Absent fields and blank strings are only checked by `required`,
//! `present` and `filled`. Unknown rules are logged and ignored. Every failing
//! rule contributes one message; validation never stops at the first failure.
//!
//! `regex:` patterns are compiled once per process. [`RuleSets::new`] compiles
//! the patterns of its rules up front and logs the invalid ones; a field
//! checked against an invalid pattern always fails.
//!
//! [`RuleSets::new`]: crate::rules::RuleSets::new
//!
//! ```rust,ignore
//! let rules = RuleSet::from([("title", "required|string|max:255"), ("pages", "nullable|integer|min:1")]);
//! let validation = RuleValidator.validate(&fields, &rules);
//! if validation.failed() {
//!     return respond(400, json!({"fails": validation.errors()}), "Invalid parameters");
//! }
//! ```

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use validator::ValidateEmail;

use crate::Fields;
use crate::rules::RuleSet;

/// Outcome of validating one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    errors: Vec<String>,
}

impl Validation {
    #[must_use]
    pub fn passed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

impl FromIterator<String> for Validation {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// A validation engine.
pub trait Validator: Send + Sync {
    fn validate(&self, data: &Fields, rules: &RuleSet) -> Validation;
}

/// The default rule-string validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl Validator for RuleValidator {
    fn validate(&self, data: &Fields, rules: &RuleSet) -> Validation {
        let mut validation = Validation::passed();
        for (field, field_rules) in rules.iter() {
            let parsed: Vec<Rule<'_>> = field_rules.iter().map(|rule| Rule::parse(rule)).collect();
            validate_field(field, data.get(field), &parsed, &mut validation);
        }
        validation
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Rule<'a> {
    Required,
    Present,
    Filled,
    Nullable,
    Sometimes,
    String,
    Integer,
    Numeric,
    Boolean,
    Array,
    Email,
    Uuid,
    Min(&'a str),
    Max(&'a str),
    Between(&'a str, &'a str),
    Size(&'a str),
    In(Vec<&'a str>),
    NotIn(Vec<&'a str>),
    Regex(&'a str),
    Unknown(&'a str),
}

impl<'a> Rule<'a> {
    fn parse(rule: &'a str) -> Self {
        let (name, params) = match rule.split_once(':') {
            Some((name, params)) => (name.trim(), Some(params)),
            None => (rule.trim(), None),
        };

        match (name, params) {
            ("required", None) => Self::Required,
            ("present", None) => Self::Present,
            ("filled", None) => Self::Filled,
            ("nullable", None) => Self::Nullable,
            ("sometimes", None) => Self::Sometimes,
            ("string", None) => Self::String,
            ("integer", None) => Self::Integer,
            ("numeric", None) => Self::Numeric,
            ("boolean", None) => Self::Boolean,
            ("array", None) => Self::Array,
            ("email", None) => Self::Email,
            ("uuid", None) => Self::Uuid,
            ("min", Some(n)) => Self::Min(n.trim()),
            ("max", Some(n)) => Self::Max(n.trim()),
            ("size", Some(n)) => Self::Size(n.trim()),
            ("between", Some(range)) => match range.split_once(',') {
                Some((low, high)) => Self::Between(low.trim(), high.trim()),
                None => Self::Unknown(rule),
            },
            ("in", Some(list)) => Self::In(list.split(',').map(str::trim).collect()),
            ("not_in", Some(list)) => Self::NotIn(list.split(',').map(str::trim).collect()),
            ("regex", Some(pattern)) => Self::Regex(pattern),
            _ => Self::Unknown(rule),
        }
    }

    /// Rules that run even when the value is absent or blank.
    fn is_implicit(&self) -> bool {
        matches!(self, Self::Required | Self::Present | Self::Filled)
    }
}

fn validate_field(field: &str, value: Option<&Value>, rules: &[Rule<'_>], out: &mut Validation) {
    let label = field.replace('_', " ");

    let Some(value) = value else {
        for rule in rules {
            match rule {
                Rule::Required => out.add(format!("The {label} field is required.")),
                Rule::Present => out.add(format!("The {label} field must be present.")),
                _ => {}
            }
        }
        return;
    };

    for rule in rules.iter().filter(|rule| rule.is_implicit()) {
        match rule {
            Rule::Required if is_empty(value) => {
                out.add(format!("The {label} field is required."));
            }
            Rule::Filled if is_empty(value) => {
                out.add(format!("The {label} field must have a value."));
            }
            _ => {}
        }
    }

    if value.is_null() && rules.contains(&Rule::Nullable) {
        return;
    }
    if value.as_str().is_some_and(|text| text.trim().is_empty()) {
        return;
    }

    let numeric = rules.iter().any(|rule| matches!(rule, Rule::Numeric | Rule::Integer));
    for rule in rules.iter().filter(|rule| !rule.is_implicit()) {
        if let Some(message) = check(rule, &label, value, numeric) {
            out.add(message);
        }
    }
}

/// Runs one non-implicit rule, returning the failure message if it fails.
fn check(rule: &Rule<'_>, label: &str, value: &Value, numeric: bool) -> Option<String> {
    let fails = |passed: bool, message: String| (!passed).then_some(message);

    match rule {
        Rule::String => fails(value.is_string(), format!("The {label} field must be a string.")),
        Rule::Integer => fails(is_integer(value), format!("The {label} field must be an integer.")),
        Rule::Numeric => fails(as_number(value).is_some(), format!("The {label} field must be a number.")),
        Rule::Boolean => fails(is_boolean(value), format!("The {label} field must be true or false.")),
        Rule::Array => fails(
            value.is_array() || value.is_object(),
            format!("The {label} field must be an array."),
        ),
        Rule::Email => fails(
            value.as_str().is_some_and(|text| text.validate_email()),
            format!("The {label} field must be a valid email address."),
        ),
        Rule::Uuid => fails(
            value.as_str().is_some_and(|text| uuid::Uuid::parse_str(text).is_ok()),
            format!("The {label} field must be a valid UUID."),
        ),
        Rule::Min(bound) => {
            let bound = parse_bound("min", bound)?;
            let (size, unit) = size_of(value, numeric);
            fails(size >= bound.0, unit.at_least(label, bound.1))
        }
        Rule::Max(bound) => {
            let bound = parse_bound("max", bound)?;
            let (size, unit) = size_of(value, numeric);
            fails(size <= bound.0, unit.at_most(label, bound.1))
        }
        Rule::Size(bound) => {
            let bound = parse_bound("size", bound)?;
            let (size, unit) = size_of(value, numeric);
            fails((size - bound.0).abs() < f64::EPSILON, unit.exactly(label, bound.1))
        }
        Rule::Between(low, high) => {
            let low = parse_bound("between", low)?;
            let high = parse_bound("between", high)?;
            let (size, unit) = size_of(value, numeric);
            fails(
                size >= low.0 && size <= high.0,
                unit.between(label, low.1, high.1),
            )
        }
        Rule::In(allowed) => fails(
            scalars(value).is_some_and(|items| items.iter().all(|item| allowed.contains(&item.as_str()))),
            format!("The selected {label} is invalid."),
        ),
        Rule::NotIn(denied) => fails(
            scalars(value).is_none_or(|items| items.iter().all(|item| !denied.contains(&item.as_str()))),
            format!("The selected {label} is invalid."),
        ),
        Rule::Regex(source) => fails(
            value
                .as_str()
                .is_some_and(|text| pattern(source).is_some_and(|regex| regex.is_match(text))),
            format!("The {label} field format is invalid."),
        ),
        Rule::Unknown(rule) => {
            tracing::warn!(rule = %rule, field = %label, "Ignoring unknown validation rule");
            None
        }
        Rule::Required | Rule::Present | Rule::Filled | Rule::Nullable | Rule::Sometimes => None,
    }
}

fn parse_bound<'a>(rule: &str, bound: &'a str) -> Option<(f64, &'a str)> {
    match bound.parse::<f64>() {
        Ok(number) => Some((number, bound)),
        Err(_) => {
            tracing::warn!(rule = %rule, parameter = %bound, "Ignoring validation rule with a non-numeric parameter");
            None
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(number) => number.is_i64() || number.is_u64(),
        Value::String(text) => text.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(number) => matches!(number.as_u64(), Some(0 | 1)),
        Value::String(text) => matches!(text.as_str(), "0" | "1"),
        _ => false,
    }
}

type PatternCache = RwLock<HashMap<String, Option<Regex>>>;

fn patterns() -> &'static PatternCache {
    static PATTERNS: OnceLock<PatternCache> = OnceLock::new();
    PATTERNS.get_or_init(PatternCache::default)
}

/// The compiled `regex:` parameter `source`, or `None` when it is invalid.
fn pattern(source: &str) -> Option<Regex> {
    let cached = patterns()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(source)
        .cloned();
    if let Some(compiled) = cached {
        return compiled;
    }

    let compiled = compile_pattern(source)
        .inspect_err(|err| {
            tracing::error!(pattern = %source, error = %err, "Invalid regex validation rule");
        })
        .ok();
    patterns()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(source.to_owned(), compiled.clone());
    compiled
}

/// Compiles `source`, accepting an optional `/.../flags` wrapper.
fn compile_pattern(source: &str) -> Result<Regex, regex::Error> {
    let (body, flags) = match source.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
        Some((body, flags)) => (body, flags),
        None => (source, ""),
    };

    RegexBuilder::new(body)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
}

/// Compiles every `regex:` pattern in `rules` ahead of validation.
pub(crate) fn compile_patterns(rules: &RuleSet) {
    for (_, field_rules) in rules.iter() {
        for rule in field_rules {
            if let Rule::Regex(source) = Rule::parse(rule) {
                pattern(source);
            }
        }
    }
}

/// String forms of a scalar value, or of every element of an array of scalars.
fn scalars(value: &Value) -> Option<Vec<String>> {
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items.iter().map(scalar).collect(),
        other => scalar(other).map(|item| vec![item]),
    }
}

#[derive(Debug, Clone, Copy)]
enum SizeUnit {
    Number,
    Characters,
    Items,
}

impl SizeUnit {
    fn at_least(self, label: &str, n: &str) -> String {
        match self {
            Self::Number => format!("The {label} field must be at least {n}."),
            Self::Characters => format!("The {label} field must be at least {n} characters."),
            Self::Items => format!("The {label} field must have at least {n} items."),
        }
    }

    fn at_most(self, label: &str, n: &str) -> String {
        match self {
            Self::Number => format!("The {label} field must not be greater than {n}."),
            Self::Characters => {
                format!("The {label} field must not be greater than {n} characters.")
            }
            Self::Items => format!("The {label} field must not have more than {n} items."),
        }
    }

    fn exactly(self, label: &str, n: &str) -> String {
        match self {
            Self::Number => format!("The {label} field must be {n}."),
            Self::Characters => format!("The {label} field must be {n} characters."),
            Self::Items => format!("The {label} field must contain {n} items."),
        }
    }

    fn between(self, label: &str, low: &str, high: &str) -> String {
        match self {
            Self::Number => format!("The {label} field must be between {low} and {high}."),
            Self::Characters => {
                format!("The {label} field must be between {low} and {high} characters.")
            }
            Self::Items => format!("The {label} field must have between {low} and {high} items."),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn size_of(value: &Value, numeric: bool) -> (f64, SizeUnit) {
    match value {
        Value::Number(number) => (number.as_f64().unwrap_or_default(), SizeUnit::Number),
        Value::String(text) => match as_number(value) {
            Some(number) if numeric => (number, SizeUnit::Number),
            _ => (text.chars().count() as f64, SizeUnit::Characters),
        },
        Value::Array(items) => (items.len() as f64, SizeUnit::Items),
        Value::Object(map) => (map.len() as f64, SizeUnit::Items),
        Value::Bool(flag) => (f64::from(u8::from(*flag)), SizeUnit::Number),
        Value::Null => (0.0, SizeUnit::Characters),
    }
}
