use super::*;

/// The distance function used for similarity calculations.
///
/// Smaller is always closer under both metrics.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[derive(PartialEq, Eq, Hash)]
pub enum Distance {
    /// Euclidean (L2) distance: `sqrt(sum((a_i - b_i)^2))`.
    Euclidean,
    /// Cosine distance: `1 - cos(a, b)`. Zero-norm operands yield `1.0`.
    Cosine,
}

impl Distance {
    /// Creates a new distance function from a string.
    /// Available options:
    /// * `euclidean`: Euclidean distance function.
    /// * `cosine`: Cosine similarity function.
    pub fn from(distance: &str) -> Result<Self, Error> {
        match distance {
            "euclidean" => Ok(Distance::Euclidean),
            "cosine" => Ok(Distance::Cosine),
            _ => Err(Error::unknown_metric(distance)),
        }
    }

    /// Returns the canonical name of the metric.
    pub fn name(&self) -> &'static str {
        match self {
            Distance::Euclidean => "euclidean",
            Distance::Cosine => "cosine",
        }
    }

    /// Calculates the distance between two vectors of equal dimension.
    ///
    /// Fails with `DimensionMismatch` if the operands differ in length.
    /// NaN never arises from finite input under either metric; any NaN
    /// that does occur is treated as `+inf` so it sorts last instead of
    /// poisoning comparisons.
    pub fn calculate(&self, a: &Vector, b: &Vector) -> Result<f32, Error> {
        if a.len() != b.len() {
            return Err(Error::dimension_mismatch(a.len(), b.len()));
        }

        let distance = match self {
            Distance::Euclidean => Self::euclidean(a, b),
            Distance::Cosine => Self::cosine(a, b),
        };

        Ok(if distance.is_nan() { f32::INFINITY } else { distance })
    }

    // List additional distance functions below.
    fn dot(a: &Vector, b: &Vector) -> f32 {
        let zip = a.0.iter().zip(b.0.iter());
        zip.map(|(x, y)| x * y).sum()
    }

    fn cosine(a: &Vector, b: &Vector) -> f32 {
        let (norm_a, norm_b) = (a.squared_norm(), b.squared_norm());
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }

        let similarity = Self::dot(a, b) / (norm_a.sqrt() * norm_b.sqrt());
        1.0 - similarity
    }

    fn euclidean(a: &Vector, b: &Vector) -> f32 {
        let zip = a.0.iter().zip(b.0.iter());
        zip.map(|(a, b)| (a - b).powi(2)).sum::<f32>().sqrt()
    }
}
