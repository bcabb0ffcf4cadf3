//! Stochastic draws used by the passenger generator (§4.3).

use rand::Rng;
use rand_distr::{Distribution, Exp};

/// Something that can sample an inter-arrival delay (seconds) given a rate
/// `lambda` in passengers/sec. Exists as a trait so the generator does not
/// depend on `rand_distr` directly and so a deterministic/test stub can be
/// substituted.
pub trait InterArrivalDistribution {
    fn sample_delay<R: Rng + ?Sized>(&self, lambda: f64, rng: &mut R) -> f64;
}

/// Poisson-process inter-arrival times: `Delta ~ Exp(lambda)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialInterArrival;

impl InterArrivalDistribution for ExponentialInterArrival {
    fn sample_delay<R: Rng + ?Sized>(&self, lambda: f64, rng: &mut R) -> f64 {
        debug_assert!(lambda > 0.0, "sample_delay requires a positive rate");
        let dist = Exp::new(lambda).expect("positive rate yields a valid Exp distribution");
        dist.sample(rng)
    }
}

/// Sample a destination index from `weights`, after zeroing out every index
/// at or before `origin_index` and renormalising (§4.3 destination draw).
/// Returns `None` if the renormalised vector has zero mass (origin is
/// terminal or all remaining weights are zero).
pub fn sample_destination_index<R: Rng + ?Sized>(
    weights: &[f64],
    origin_index: usize,
    rng: &mut R,
) -> Option<usize> {
    let masked: Vec<f64> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| if i > origin_index { w.max(0.0) } else { 0.0 })
        .collect();
    let total: f64 = masked.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let mut draw = rng.gen::<f64>() * total;
    for (i, &w) in masked.iter().enumerate() {
        if draw < w {
            return Some(i);
        }
        draw -= w;
    }
    masked.iter().rposition(|&w| w > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn exponential_sample_is_nonnegative() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = ExponentialInterArrival;
        for _ in 0..100 {
            assert!(dist.sample_delay(0.1, &mut rng) >= 0.0);
        }
    }

    #[test]
    fn destination_draw_masks_origin_and_earlier() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = vec![1.0, 1.0, 1.0, 1.0];
        for _ in 0..50 {
            let idx = sample_destination_index(&weights, 1, &mut rng).unwrap();
            assert!(idx > 1);
        }
    }

    #[test]
    fn destination_draw_none_when_terminal() {
        let mut rng = StdRng::seed_from_u64(3);
        let weights = vec![1.0, 1.0, 1.0];
        assert!(sample_destination_index(&weights, 2, &mut rng).is_none());
    }

    #[test]
    fn destination_draw_none_when_remaining_weights_all_zero() {
        let mut rng = StdRng::seed_from_u64(9);
        let weights = vec![1.0, 1.0, 0.0, 0.0];
        assert!(sample_destination_index(&weights, 1, &mut rng).is_none());
    }
}
