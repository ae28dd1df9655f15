//! The fixed set of model variants compared on every prediction call

use serde::Serialize;

use crate::domain::{Feature, FEATURE_COUNT};

/// A named model variant with hand-authored feature weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub name: &'static str,
    /// Display colour used by chart front-ends
    pub color: &'static str,
    /// Hidden layer widths of the regressor
    pub hidden_layers: &'static [usize],
    /// Weight per feature, indexed in `Feature::ALL` order
    pub feature_weights: [f64; FEATURE_COUNT],
}

impl ModelDescriptor {
    pub fn weight(&self, feature: Feature) -> f64 {
        self.feature_weights[feature.index()]
    }

    /// Network layer layout for this descriptor, input and output included
    pub fn layout(&self) -> Vec<usize> {
        let mut layout = Vec::with_capacity(self.hidden_layers.len() + 2);
        layout.push(FEATURE_COUNT);
        layout.extend_from_slice(self.hidden_layers);
        layout.push(1);
        layout
    }
}

pub const NEURAL_NETWORK: &str = "neural_network";

//                                        irr   temp  hum   wind  pm10  pm25  cloud
pub static DESCRIPTORS: [ModelDescriptor; 4] = [
    ModelDescriptor {
        name: "random_forest",
        color: "#0ea5e9",
        hidden_layers: &[10],
        feature_weights: [0.65, 0.15, 0.08, 0.03, 0.04, 0.05, 0.09],
    },
    ModelDescriptor {
        name: "gradient_boosting",
        color: "#10b981",
        hidden_layers: &[10],
        feature_weights: [0.55, 0.25, 0.06, 0.03, 0.07, 0.08, 0.12],
    },
    ModelDescriptor {
        name: NEURAL_NETWORK,
        color: "#8b5cf6",
        hidden_layers: &[16, 8],
        feature_weights: [0.60, 0.20, 0.07, 0.04, 0.03, 0.05, 0.10],
    },
    ModelDescriptor {
        name: "support_vector",
        color: "#f97316",
        hidden_layers: &[10],
        feature_weights: [0.58, 0.18, 0.09, 0.05, 0.06, 0.06, 0.08],
    },
];

pub fn find(name: &str) -> Option<&'static ModelDescriptor> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}
