//! Name-to-constructor registry for distance measures.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::derivative::{Ddtw, DerivativeCache, Wddtw};
use crate::dtw::Dtw;
use crate::erp::Erp;
use crate::error::DistanceError;
use crate::lcss::Lcss;
use crate::measure::DistanceMeasure;
use crate::msm::Msm;
use crate::options::Options;
use crate::twe::Twe;
use crate::wdtw::Wdtw;

type Constructor = Box<dyn Fn() -> Box<dyn DistanceMeasure> + Send + Sync>;

/// Builds distance measures from their canonical names.
///
/// Built once and passed by reference wherever a measure must be created
/// from configuration.
pub struct MeasureRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl MeasureRegistry {
    /// Create a registry with no measures.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Create a registry holding every built-in measure.
    ///
    /// `ddtw` and `wddtw` share one [`DerivativeCache`].
    #[must_use]
    pub fn standard() -> Self {
        let cache = Arc::new(DerivativeCache::new());
        let mut registry = Self::empty();
        registry.register(Dtw::NAME, || Box::new(Dtw::default()));
        registry.register(Wdtw::NAME, || Box::new(Wdtw::default()));
        let ddtw_cache = Arc::clone(&cache);
        registry.register(Ddtw::NAME, move || {
            Box::new(Ddtw::with_cache(Dtw::default(), Arc::clone(&ddtw_cache)))
        });
        registry.register(Wddtw::NAME, move || {
            Box::new(Wddtw::with_cache(Wdtw::default(), Arc::clone(&cache)))
        });
        registry.register(Lcss::NAME, || Box::new(Lcss::default()));
        registry.register(Erp::NAME, || Box::new(Erp::default()));
        registry.register(Msm::NAME, || Box::new(Msm::default()));
        registry.register(Twe::NAME, || Box::new(Twe::default()));
        registry
    }

    /// Register `constructor` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &'static str, constructor: F)
    where
        F: Fn() -> Box<dyn DistanceMeasure> + Send + Sync + 'static,
    {
        self.constructors.insert(name, Box::new(constructor));
    }

    /// Create a measure with default configuration.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::UnknownMeasure`] | No measure is registered under `name` |
    pub fn create(&self, name: &str) -> Result<Box<dyn DistanceMeasure>, DistanceError> {
        self.constructors
            .get(name)
            .map(|construct| construct())
            .ok_or_else(|| DistanceError::UnknownMeasure {
                name: name.to_string(),
            })
    }

    /// Create a measure and apply `options` to it.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::UnknownMeasure`] | No measure is registered under `name` |
    /// | [`DistanceError::UnknownOption`] | The measure does not recognise an option key |
    /// | [`DistanceError::InvalidOptionValue`] | An option value is rejected |
    pub fn create_with_options(
        &self,
        name: &str,
        options: &Options,
    ) -> Result<Box<dyn DistanceMeasure>, DistanceError> {
        let mut measure = self.create(name)?;
        measure.set_options(options)?;
        Ok(measure)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    /// Return true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl Default for MeasureRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for MeasureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasureRegistry")
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_holds_every_measure() {
        let registry = MeasureRegistry::standard();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec!["ddtw", "dtw", "erp", "lcss", "msm", "twe", "wddtw", "wdtw"]
        );
    }

    #[test]
    fn created_measure_reports_its_name() {
        let registry = MeasureRegistry::standard();
        for name in registry.names() {
            assert_eq!(registry.create(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_name_fails() {
        let err = MeasureRegistry::standard().create("euclid").unwrap_err();
        assert_eq!(
            err,
            DistanceError::UnknownMeasure {
                name: "euclid".to_string()
            }
        );
    }

    #[test]
    fn create_with_options_applies_them() {
        let registry = MeasureRegistry::standard();
        let opts = Options::parse(&["cost", "0.5"]).unwrap();
        let msm = registry.create_with_options("msm", &opts).unwrap();
        assert_eq!(msm.options().get("cost"), Some("0.5"));
    }

    #[test]
    fn create_with_bad_options_fails() {
        let registry = MeasureRegistry::standard();
        let opts = Options::parse(&["window", "2"]).unwrap();
        assert!(registry.create_with_options("twe", &opts).is_err());
    }

    #[test]
    fn empty_registry_contains_nothing() {
        let registry = MeasureRegistry::empty();
        assert!(!registry.contains("dtw"));
        assert_eq!(registry.names().count(), 0);
    }
}
