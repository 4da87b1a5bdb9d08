//! Canonical spike waveform template.
//!
//! Spike trains in this importer are synthesized, and every spike carries a
//! noisy copy of one canonical snippet. The snippet is cut from a
//! parametrized density curve and is only available when the crate is built
//! with the `waveforms` feature; without it [`spike_template`] reports the
//! missing backend by returning `None`.

#[cfg(feature = "waveforms")]
use statrs::distribution::{Continuous, StudentsT};

// Parameters of the density curve the template is cut from.
#[cfg(feature = "waveforms")]
const CURVE_LOCATION: f64 = 20.0;
#[cfg(feature = "waveforms")]
const CURVE_SCALE: f64 = 5.0;
#[cfg(feature = "waveforms")]
const CURVE_FREEDOM: f64 = 5.0;

/// Builds the canonical spike snippet.
///
/// Two lobes are sampled from the curve at fixed offsets: an attenuated,
/// mirrored leading lobe followed by a denser main lobe. The result is
/// normalized with `-w / max(w)` so the dominant deflection sits at exactly
/// -1, matching typical extracellular spike polarity.
#[cfg(feature = "waveforms")]
pub(crate) fn spike_template() -> Option<Vec<f64>> {
    let curve = StudentsT::new(CURVE_LOCATION, CURVE_SCALE, CURVE_FREEDOM).ok()?;

    let mut template: Vec<f64> = (11..60)
        .step_by(4)
        .map(|x| -curve.pdf(x as f64) / 3.0)
        .collect();
    template.reverse();
    template.extend((11..60).step_by(2).map(|x| curve.pdf(x as f64)));

    let peak = template.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for value in &mut template {
        *value = -*value / peak;
    }
    Some(template)
}

#[cfg(not(feature = "waveforms"))]
pub(crate) fn spike_template() -> Option<Vec<f64>> {
    None
}

#[cfg(all(test, feature = "waveforms"))]
mod tests {
    use super::*;

    #[test]
    fn template_extreme_is_negative_unit() {
        let template = spike_template().unwrap();
        let extreme = template
            .iter()
            .copied()
            .max_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap())
            .unwrap();
        assert!((extreme.abs() - 1.0).abs() < 1e-12);
        assert!(extreme < 0.0);
    }

    #[test]
    fn template_has_fixed_length() {
        // 13 leading-lobe samples plus 25 main-lobe samples
        assert_eq!(spike_template().unwrap().len(), 38);
    }
}
