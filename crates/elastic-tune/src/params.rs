//! Named parameters, parameter sets and cartesian parameter spaces.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use elastic_distance::Options;

use crate::error::ParamError;

/// Name of the dimension holding the canonical distance measure name.
pub const MEASURE: &str = "measure";

/// A parameter value.
///
/// Floats compare and hash by bit pattern, so `0.0` and `-0.0` are distinct
/// and a NaN equals itself.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Integer value, e.g. a window size.
    Int(i64),
    /// Real value, e.g. a penalty.
    Float(f64),
    /// Text value, e.g. a measure name.
    Text(String),
}

impl ParamValue {
    /// Parse a stringified value, preferring integer, then float, then text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Ok(int) = raw.parse::<i64>() {
            return Self::Int(int);
        }
        match raw.parse::<f64>() {
            Ok(float) if float.is_finite() => Self::Float(float),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Return the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Return the value as a float, if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(int) => Some(*int as f64),
            Self::Float(float) => Some(*float),
            Self::Text(_) => None,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Int(int) => int.hash(state),
            Self::Float(float) => float.to_bits().hash(state),
            Self::Text(text) => text.hash(state),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A named parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Parameter name, used as the option key.
    pub name: String,
    /// Parameter value.
    pub value: ParamValue,
}

/// An ordered list of parameters with unique names.
///
/// Equality and hashing are by content and order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParameterSet(Vec<Parameter>);

impl ParameterSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-style [`ParameterSet::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Parameter { name, value }),
        }
    }

    /// Look up a parameter value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Canonical measure name carried by the [`MEASURE`] dimension.
    #[must_use]
    pub fn measure(&self) -> Option<&str> {
        self.get(MEASURE).and_then(ParamValue::as_text)
    }

    /// Number of parameters in the set.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return true if the set has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    /// Encode as an option vector.
    #[must_use]
    pub fn to_options(&self) -> Options {
        self.0.iter().fold(Options::new(), |options, p| {
            options.with(p.name.as_str(), &p.value)
        })
    }

    /// Decode an option vector, typing each value with [`ParamValue::parse`].
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        options
            .iter()
            .fold(Self::new(), |set, (key, value)| set.with(key, ParamValue::parse(value)))
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_options())
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A list of candidate parameter sets.
///
/// Built by adding dimensions (cartesian expansion) and by appending other
/// spaces (union). Duplicates are allowed until
/// [`remove_duplicate_values`](ParameterSpace::remove_duplicate_values).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpace {
    sets: Vec<ParameterSet>,
}

impl ParameterSpace {
    /// Create a space with no sets.
    #[must_use]
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Create a space from explicit sets.
    #[must_use]
    pub fn from_sets(sets: Vec<ParameterSet>) -> Self {
        Self { sets }
    }

    /// Expand every set by each of `values` under `name`.
    ///
    /// On an empty space this creates one set per value. Sets are expanded
    /// in order, with the new dimension varying fastest.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ParamError::EmptyDimension`] | `values` is empty |
    pub fn add_dimension<V, It>(&mut self, name: &str, values: It) -> Result<(), ParamError>
    where
        V: Into<ParamValue>,
        It: IntoIterator<Item = V>,
    {
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(ParamError::EmptyDimension {
                name: name.to_string(),
            });
        }
        let bases = if self.sets.is_empty() {
            vec![ParameterSet::new()]
        } else {
            std::mem::take(&mut self.sets)
        };
        self.sets = bases
            .iter()
            .flat_map(|base| {
                values
                    .iter()
                    .map(move |value| base.clone().with(name, value.clone()))
            })
            .collect();
        Ok(())
    }

    /// Builder-style [`ParameterSpace::add_dimension`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ParamError::EmptyDimension`] | `values` is empty |
    pub fn with_dimension<V, It>(mut self, name: &str, values: It) -> Result<Self, ParamError>
    where
        V: Into<ParamValue>,
        It: IntoIterator<Item = V>,
    {
        self.add_dimension(name, values)?;
        Ok(self)
    }

    /// Append every set of `other`.
    pub fn add_all(&mut self, other: ParameterSpace) {
        self.sets.extend(other.sets);
    }

    /// Drop repeated sets, keeping the first occurrence of each.
    pub fn remove_duplicate_values(&mut self) {
        let mut seen = HashSet::with_capacity(self.sets.len());
        self.sets.retain(|set| seen.insert(set.clone()));
    }

    /// Number of sets in the space.
    #[must_use]
    pub fn size(&self) -> usize {
        self.sets.len()
    }

    /// Return true if the space has no sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Borrow the sets in order.
    #[must_use]
    pub fn sets(&self) -> &[ParameterSet] {
        &self.sets
    }

    /// Iterate the sets in order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSet> {
        self.sets.iter()
    }

    /// Take ownership of the sets.
    #[must_use]
    pub fn into_sets(self) -> Vec<ParameterSet> {
        self.sets
    }
}

impl IntoIterator for ParameterSpace {
    type Item = ParameterSet;
    type IntoIter = std::vec::IntoIter<ParameterSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.into_iter()
    }
}

impl FromIterator<ParameterSet> for ParameterSpace {
    fn from_iter<It: IntoIterator<Item = ParameterSet>>(iter: It) -> Self {
        Self::from_sets(iter.into_iter().collect())
    }
}

fn check_range(min: f64, max: f64, size: usize) -> Result<(), ParamError> {
    if size == 0 {
        return Err(ParamError::ZeroSizeRange);
    }
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(ParamError::InvalidBounds { min, max });
    }
    Ok(())
}

/// `size` evenly incremented reals from `min` to `max` inclusive.
///
/// Intermediate points accumulate the step, and the last point is pinned to
/// `max`. A single-point range is `[max]`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::ZeroSizeRange`] | `size` is zero |
/// | [`ParamError::InvalidBounds`] | A bound is non-finite or `min > max` |
pub fn incremental_range(min: f64, max: f64, size: usize) -> Result<Vec<f64>, ParamError> {
    check_range(min, max, size)?;
    if size == 1 {
        return Ok(vec![max]);
    }
    #[allow(clippy::cast_precision_loss)]
    let step = (max - min) / (size - 1) as f64;
    let mut values = Vec::with_capacity(size);
    let mut current = min;
    values.push(min);
    for _ in 1..size - 1 {
        current += step;
        values.push(current);
    }
    values.push(max);
    Ok(values)
}

/// `size` evenly incremented integers from `min` to `max` inclusive, each
/// rounded to the nearest integer. Small ranges repeat values; pass the
/// result through [`unique`] when distinct values are needed.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ParamError::ZeroSizeRange`] | `size` is zero |
/// | [`ParamError::InvalidBounds`] | `min > max` |
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn incremental_int_range(min: i64, max: i64, size: usize) -> Result<Vec<i64>, ParamError> {
    incremental_range(min as f64, max as f64, size).map(|values| {
        values
            .into_iter()
            .map(|value| value.round() as i64)
            .collect()
    })
}

/// Distinct values in first-occurrence order.
pub fn unique<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
