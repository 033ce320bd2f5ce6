//! Feature weight tables
//!
//! A [`WeightTable`] declares which descriptor features take part in the
//! overall similarity score and how much each one counts. Tables are plain
//! configuration: they can be loaded from JSON, overridden per query and
//! normalized before use.

use geosearch_core::Descriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A comparable descriptor feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Volume,
    SurfaceArea,
    Sphericity,
    Compactness,
    AspectRatio1,
    AspectRatio2,
    Elongation,
    /// Not weighted by default
    Convexity,
    MeanCurvature,
    GaussianCurvature,
    CurvatureVariance,
    /// Compared by histogram overlap; its reported value is the D2 mean
    ShapeDistribution,
}

impl Feature {
    /// Features reported in every comparison breakdown, weighted or not.
    pub const ALWAYS_REPORTED: [Feature; 3] =
        [Feature::Volume, Feature::SurfaceArea, Feature::Sphericity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Volume => "volume",
            Feature::SurfaceArea => "surfaceArea",
            Feature::Sphericity => "sphericity",
            Feature::Compactness => "compactness",
            Feature::AspectRatio1 => "aspectRatio1",
            Feature::AspectRatio2 => "aspectRatio2",
            Feature::Elongation => "elongation",
            Feature::Convexity => "convexity",
            Feature::MeanCurvature => "meanCurvature",
            Feature::GaussianCurvature => "gaussianCurvature",
            Feature::CurvatureVariance => "curvatureVariance",
            Feature::ShapeDistribution => "shapeDistribution",
        }
    }

    /// Scalar value of this feature in `descriptor`
    pub fn value(&self, descriptor: &Descriptor) -> f64 {
        match self {
            Feature::Volume => descriptor.volume,
            Feature::SurfaceArea => descriptor.surface_area,
            Feature::Sphericity => descriptor.sphericity,
            Feature::Compactness => descriptor.compactness,
            Feature::AspectRatio1 => descriptor.aspect_ratio1,
            Feature::AspectRatio2 => descriptor.aspect_ratio2,
            Feature::Elongation => descriptor.elongation,
            Feature::Convexity => descriptor.convexity,
            Feature::MeanCurvature => descriptor.mean_curvature,
            Feature::GaussianCurvature => descriptor.gaussian_curvature,
            Feature::CurvatureVariance => descriptor.curvature_variance,
            Feature::ShapeDistribution => descriptor.shape_distribution.mean,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight table version 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightTable {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Weight per feature; features left out do not contribute
    pub weights: BTreeMap<Feature, f64>,
}

fn default_version() -> u32 {
    1
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::new(BTreeMap::from([
            (Feature::Volume, 0.2),
            (Feature::SurfaceArea, 0.2),
            (Feature::Sphericity, 0.2),
            (Feature::ShapeDistribution, 0.2),
            (Feature::Compactness, 0.05),
            (Feature::AspectRatio1, 0.05),
            (Feature::AspectRatio2, 0.05),
            (Feature::Elongation, 0.05),
        ]))
    }
}

impl WeightTable {
    pub fn new(weights: BTreeMap<Feature, f64>) -> Self {
        Self { version: 1, weights }
    }

    /// Validate the table
    /// - Rejects empty tables and negative or non-finite weights
    /// - Normalizes weights to sum to 1.0 if they don't
    pub fn validate_and_normalize(&mut self) -> Result<(), SchemaError> {
        if self.weights.is_empty() {
            return Err(SchemaError::EmptyTable);
        }

        for (&feature, &weight) in &self.weights {
            if !weight.is_finite() {
                return Err(SchemaError::NonFiniteWeight(feature));
            }
            if weight < 0.0 {
                return Err(SchemaError::NegativeWeight(feature));
            }
        }

        let total = self.total();
        if total <= 0.0 {
            return Err(SchemaError::ZeroTotalWeight);
        }

        if (total - 1.0).abs() > 1e-9 {
            for weight in self.weights.values_mut() {
                *weight /= total;
            }
        }

        Ok(())
    }

    #[inline]
    pub fn get(&self, feature: Feature) -> f64 {
        self.weights.get(&feature).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Weighted features followed by the always-reported ones, deduplicated
    /// and in a stable order.
    pub fn reported_features(&self) -> Vec<Feature> {
        let mut features: Vec<Feature> = self.weights.keys().copied().collect();
        features.extend(Feature::ALWAYS_REPORTED);
        features.sort();
        features.dedup();
        features
    }
}

/// Errors that can occur during weight table validation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Weight table cannot be empty")]
    EmptyTable,

    #[error("Feature '{0}' has negative weight")]
    NegativeWeight(Feature),

    #[error("Feature '{0}' has a non-finite weight")]
    NonFiniteWeight(Feature),

    #[error("Total weight cannot be zero")]
    ZeroTotalWeight,
}
