//! D2 shape distribution
//!
//! Monte Carlo histogram of distances between random point pairs on the
//! surface. Bins span `[0, range_factor * bounding diameter]` so histograms of
//! differently sized models line up, and a rotated model keeps its histogram.

use crate::cancel::CancelToken;
use crate::geometry::bounding_diameter;
use crate::mesh::Triangle;
use crate::{Error, Mesh, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_COUNT: usize = 1024;
pub const DEFAULT_BIN_COUNT: usize = 10;
pub const DEFAULT_SEED: u64 = 0x5EED_D2;

/// Sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerOptions {
    /// Number of point pairs drawn
    pub sample_count: usize,
    pub bin_count: usize,
    pub seed: u64,
    /// Histogram range as a multiple of the bounding diameter
    pub range_factor: f64,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            bin_count: DEFAULT_BIN_COUNT,
            seed: DEFAULT_SEED,
            range_factor: 1.0,
        }
    }
}

impl SamplerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(Error::InvalidConfig("sample_count must be at least 1".to_string()));
        }
        if self.bin_count == 0 {
            return Err(Error::InvalidConfig("bin_count must be at least 1".to_string()));
        }
        if !(self.range_factor.is_finite() && self.range_factor > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "range_factor must be positive, got {}",
                self.range_factor
            )));
        }
        Ok(())
    }
}

/// Summary of sampled pair distances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeDistribution {
    pub mean: f64,
    pub std_dev: f64,
    /// Probability mass per bin, sums to 1
    pub histogram: Vec<f64>,
}

impl ShapeDistribution {
    /// Distribution of a surface without area: all mass in the first bin.
    pub fn degenerate(bin_count: usize) -> Self {
        let mut histogram = vec![0.0; bin_count.max(1)];
        histogram[0] = 1.0;
        Self { mean: 0.0, std_dev: 0.0, histogram }
    }
}

pub fn sample(mesh: &Mesh, options: &SamplerOptions) -> Result<ShapeDistribution> {
    sample_with_cancel(mesh, options, &CancelToken::new())
}

/// Draw `sample_count` pairs; `cancel` is checked before every pair.
pub fn sample_with_cancel(
    mesh: &Mesh,
    options: &SamplerOptions,
    cancel: &CancelToken,
) -> Result<ShapeDistribution> {
    options.validate()?;
    mesh.validate()?;

    let Some(surface) = SurfaceSampler::new(mesh) else {
        return Ok(ShapeDistribution::degenerate(options.bin_count));
    };

    let range = options.range_factor * bounding_diameter(mesh);
    let bin_width = range / options.bin_count as f64;
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut counts = vec![0usize; options.bin_count];
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for _ in 0..options.sample_count {
        cancel.check()?;
        let p = surface.sample(&mut rng);
        let q = surface.sample(&mut rng);
        let d = (p - q).norm();
        sum += d;
        sum_sq += d * d;

        let bin = if bin_width > 0.0 { (d / bin_width) as usize } else { 0 };
        counts[bin.min(options.bin_count - 1)] += 1;
    }

    let n = options.sample_count as f64;
    let mean = sum / n;
    let std_dev = (sum_sq / n - mean * mean).max(0.0).sqrt();
    let histogram = counts.into_iter().map(|c| c as f64 / n).collect();

    Ok(ShapeDistribution { mean, std_dev, histogram })
}

/// Area-weighted uniform surface sampler
struct SurfaceSampler {
    triangles: Vec<Triangle>,
    /// Running area total, one entry per triangle
    cumulative: Vec<f64>,
    total: f64,
}

impl SurfaceSampler {
    /// `None` when the mesh has no surface area to sample from.
    fn new(mesh: &Mesh) -> Option<Self> {
        let mut triangles = Vec::with_capacity(mesh.face_count());
        let mut cumulative = Vec::with_capacity(mesh.face_count());
        let mut total = 0.0;
        for t in mesh.triangles() {
            let area = t.area();
            if area > 0.0 {
                total += area;
                triangles.push(t);
                cumulative.push(total);
            }
        }
        (total > 0.0).then_some(Self { triangles, cumulative, total })
    }

    fn sample(&self, rng: &mut StdRng) -> nalgebra::Point3<f64> {
        let target = rng.random::<f64>() * self.total;
        let index = self
            .cumulative
            .partition_point(|&c| c <= target)
            .min(self.triangles.len() - 1);

        let mut u = rng.random::<f64>();
        let mut v = rng.random::<f64>();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        self.triangles[index].point_at(u, v)
    }
}
