//! Feature importance renormalisation
//!
//! Static descriptor weights, boosted for features with a wider observed range
//! (up to 1.2x), then rescaled so the mapping sums to 1.

use std::collections::BTreeMap;

use crate::domain::Feature;
use crate::ml::MinMaxScaler;

use super::descriptors::ModelDescriptor;

pub type ImportanceMap = BTreeMap<Feature, f64>;

const MAX_RANGE_BOOST: f64 = 1.2;
const RANGE_SCALE: f64 = 1000.0;

/// Multiplicative boost for a feature whose observed range is `range`
pub fn range_influence(range: f64) -> f64 {
    if range > 0.0 {
        (1.0 + range / RANGE_SCALE).min(MAX_RANGE_BOOST)
    } else {
        1.0
    }
}

/// Importance of every feature for `descriptor`, given the scaler fitted on the dataset
pub fn feature_importance(descriptor: &ModelDescriptor, scaler: &MinMaxScaler) -> ImportanceMap {
    let boosted: ImportanceMap = Feature::ALL
        .iter()
        .map(|&f| {
            let range = if f.index() < scaler.width() {
                scaler.range(f.index())
            } else {
                0.0
            };
            (f, descriptor.weight(f) * range_influence(range))
        })
        .collect();

    normalize(boosted)
}

/// Rescale so the values sum to 1. An all-zero map becomes uniform.
pub fn normalize(mut map: ImportanceMap) -> ImportanceMap {
    let total: f64 = map.values().sum();
    if total > 0.0 {
        map.values_mut().for_each(|v| *v /= total);
    } else if !map.is_empty() {
        let uniform = 1.0 / map.len() as f64;
        map.values_mut().for_each(|v| *v = uniform);
    }
    map
}

/// Descriptor weights rescaled to sum to 1, without any range boost
pub fn static_importance(descriptor: &ModelDescriptor) -> ImportanceMap {
    normalize(Feature::ALL.iter().map(|&f| (f, descriptor.weight(f))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::descriptors::DESCRIPTORS;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    fn sum(map: &ImportanceMap) -> f64 {
        map.values().sum()
    }

    #[test]
    fn test_range_influence() {
        assert_eq!(range_influence(0.0), 1.0);
        assert!((range_influence(100.0) - 1.1).abs() < 1e-12);
        assert_eq!(range_influence(800.0), 1.2);
    }

    #[test]
    fn test_constant_dataset_keeps_static_ratios() {
        let features = Array2::from_shape_fn((3, 7), |(_, j)| [500.0, 20.0, 50.0, 3.0, 0.0, 0.0, 0.0][j]);
        let scaler = MinMaxScaler::fit(&features);
        let d = &DESCRIPTORS[0];

        let imp = feature_importance(d, &scaler);
        let stat = static_importance(d);
        for f in Feature::ALL {
            assert!((imp[&f] - stat[&f]).abs() < 1e-12);
        }
        assert!((sum(&imp) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wide_range_feature_gains_share() {
        let features = array![
            [0.0, 20.0, 50.0, 3.0, 0.0, 0.0, 0.0],
            [900.0, 20.0, 50.0, 3.0, 0.0, 0.0, 0.0],
        ];
        let scaler = MinMaxScaler::fit(&features);
        let d = &DESCRIPTORS[1];

        let imp = feature_importance(d, &scaler);
        let stat = static_importance(d);
        assert!(imp[&Feature::SolarIrradiance] > stat[&Feature::SolarIrradiance]);
        assert!(imp[&Feature::Temperature] < stat[&Feature::Temperature]);
    }

    #[test]
    fn test_all_zero_weights_become_uniform() {
        let map: ImportanceMap = Feature::ALL.iter().map(|&f| (f, 0.0)).collect();
        let n = normalize(map);
        assert!(n.values().all(|v| (v - 1.0 / 7.0).abs() < 1e-12));
    }

    proptest! {
        #[test]
        fn prop_importance_sums_to_one(
            values in (1usize..30).prop_flat_map(|n| prop::collection::vec(-1e4f64..1e4, n * 7)),
            idx in 0usize..4
        ) {
            let features = Array2::from_shape_vec((values.len() / 7, 7), values).unwrap();
            let scaler = MinMaxScaler::fit(&features);
            let imp = feature_importance(&DESCRIPTORS[idx], &scaler);
            prop_assert_eq!(imp.len(), 7);
            prop_assert!((sum(&imp) - 1.0).abs() < 1e-9);
        }
    }
}
