//! Per-pixel reduction kernel behind [`super::composite`].

use ndarray::{Array3, Zip};

use super::CompositeMethod;
use crate::algebra::ValidRange;

/// Running statistics over the valid samples of one pixel.
#[derive(Clone, Copy, Debug)]
struct Accumulator {
    count: usize,
    min: f64,
    max: f64,
    sum: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
        }
    }

    fn push(&mut self, v: f64) {
        self.count += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.sum += v;
    }
}

/// Reduce `samples` (all of the same shape) pixel by pixel.
///
/// Returns `None` for pixels without a valid sample. Float sums are taken
/// over the samples in ascending order so the result is bit-identical for
/// any ordering of `samples`; with `exact_sum` (integer sources) the plain
/// running sum is already exact.
pub fn reduce(
    samples: &[Array3<f64>],
    method: CompositeMethod,
    valid: ValidRange,
    exact_sum: bool,
) -> Array3<Option<f64>> {
    let dim = samples.first().map(|s| s.dim()).unwrap_or((0, 0, 0));
    let mut out = Array3::from_elem(dim, None);
    let ordered_sum =
        !exact_sum && matches!(method, CompositeMethod::Average | CompositeMethod::Sum);

    Zip::indexed(&mut out).par_for_each(|idx, o| {
        let mut acc = Accumulator::new();
        if ordered_sum {
            let mut valid_values: Vec<f64> = samples
                .iter()
                .map(|s| s[idx])
                .filter(|v| valid.contains(*v))
                .collect();
            valid_values.sort_by(f64::total_cmp);
            valid_values.into_iter().for_each(|v| acc.push(v));
        } else {
            samples
                .iter()
                .map(|s| s[idx])
                .filter(|v| valid.contains(*v))
                .for_each(|v| acc.push(v));
        }

        if acc.count == 0 {
            return;
        }
        *o = Some(match method {
            CompositeMethod::Min => acc.min,
            CompositeMethod::Max => acc.max,
            CompositeMethod::Average => acc.sum / acc.count as f64,
            CompositeMethod::Sum => acc.sum,
            CompositeMethod::Count => acc.count as f64,
        });
    });

    out
}
