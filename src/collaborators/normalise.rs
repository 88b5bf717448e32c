//! Explanation post-processing.
//!
//! [`AverageSecondMoment`] rescales every explanation so that the mean of its
//! squared entries is one:
//!
//! ```text
//! a_i  <-  a_i / sqrt( mean_j a_ij² )
//! ```
//!
//! where `j` runs over every non-batch index of sample `i`. A sample whose
//! entries are all zero has no scale and is left as is.
//!
//! [`absolute`] takes the elementwise absolute value; the metric applies it
//! after normalisation when both flags are set.
use ndarray::{ArrayD, Axis};

use crate::collaborators::traits::Normalise;

/// Divide each explanation by the square root of its average second moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AverageSecondMoment;

impl Normalise for AverageSecondMoment {
    fn normalise(&self, mut a_batch: ArrayD<f64>) -> ArrayD<f64> {
        if a_batch.ndim() == 0 {
            return a_batch;
        }
        for mut sample in a_batch.axis_iter_mut(Axis(0)) {
            let count = sample.len();
            if count == 0 {
                continue;
            }
            let second_moment = sample.iter().map(|v| v * v).sum::<f64>() / count as f64;
            if second_moment > 0.0 {
                let scale = second_moment.sqrt();
                sample.mapv_inplace(|v| v / scale);
            }
        }
        a_batch
    }
}

/// Elementwise absolute value of an explanation batch.
pub fn absolute(mut a_batch: ArrayD<f64>) -> ArrayD<f64> {
    a_batch.mapv_inplace(f64::abs);
    a_batch
}
