//! Flat key/value option vectors used to configure measures and classifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::DistanceError;

/// Ordered list of `(key, value)` option pairs.
///
/// The external encoding is a flat list alternating key and stringified
/// value, e.g. `["window", "3", "g", "0.05"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(Vec<(String, String)>);

impl Options {
    /// Create an empty option list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a flat alternating key/value vector.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::MalformedOptions`] | `flat` has an odd number of entries |
    pub fn parse<S: AsRef<str>>(flat: &[S]) -> Result<Self, DistanceError> {
        if flat.len() % 2 != 0 {
            return Err(DistanceError::MalformedOptions { len: flat.len() });
        }
        let pairs = flat
            .chunks_exact(2)
            .map(|pair| (pair[0].as_ref().to_string(), pair[1].as_ref().to_string()))
            .collect();
        Ok(Self(pairs))
    }

    /// Append a pair. An existing key is not replaced; use [`Options::set`] for that.
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.push((key.into(), value.to_string()));
    }

    /// Builder-style [`Options::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key` to `value`, replacing the value in place if the key exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Return the last value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Return a copy without any pair whose key is `key`.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        Self(self.0.iter().filter(|(k, _)| k != key).cloned().collect())
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append every pair of `other`.
    pub fn extend(&mut self, other: &Options) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Encode as a flat alternating key/value vector.
    #[must_use]
    pub fn to_flat(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(k, v)| [k.clone(), v.clone()])
            .collect()
    }

    /// Return the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{k} {v}")?;
            first = false;
        }
        Ok(())
    }
}

/// Parse a single option value, mapping failures to [`DistanceError::InvalidOptionValue`].
pub(crate) fn parse_value<T>(key: &str, value: &str) -> Result<T, DistanceError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| DistanceError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a finite, non-negative float option.
pub(crate) fn parse_non_negative(key: &str, value: &str) -> Result<f64, DistanceError> {
    let v: f64 = parse_value(key, value)?;
    if !v.is_finite() || v < 0.0 {
        return Err(DistanceError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be finite and non-negative".to_string(),
        });
    }
    Ok(v)
}
