//! Low-pass smoothing through a truncated real Fourier transform.

use crate::error::{AnalyticsError, Result};
use num_complex::Complex;
use rustfft::FftPlanner;
use std::str::FromStr;
use tracing::debug;

/// Whether a curve should be smoothed, and how strongly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Smoothing {
    /// Return the curve as is
    #[default]
    None,
    /// Keep only the `cutoff` lowest-frequency coefficients (DC included)
    LowPass { cutoff: usize },
}

impl Smoothing {
    /// Map an optional cutoff, where `None` means no smoothing.
    pub fn from_cutoff(cutoff: Option<usize>) -> Self {
        match cutoff {
            Some(cutoff) => Self::LowPass { cutoff },
            None => Self::None,
        }
    }

    pub fn cutoff(&self) -> Option<usize> {
        match *self {
            Self::LowPass { cutoff } => Some(cutoff),
            Self::None => None,
        }
    }

    /// Smooth `signal` if requested.
    pub fn apply(&self, signal: &[f64], reconciliation: Reconciliation) -> Result<Option<Vec<f64>>> {
        match *self {
            Self::LowPass { cutoff } => {
                fourier_smooth_with(signal, cutoff, reconciliation).map(Some)
            }
            Self::None => Ok(None),
        }
    }
}

impl FromStr for Smoothing {
    type Err = AnalyticsError;

    /// Parses `none`/`off`/`0` as no smoothing and a positive integer as a cutoff.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "" | "none" | "off" => Ok(Self::None),
            _ => {
                let cutoff: usize = s
                    .strip_prefix("lowpass:")
                    .unwrap_or(&s)
                    .parse()
                    .map_err(|_| AnalyticsError::InvalidInput(format!("invalid smoothing '{}'", s)))?;
                Ok(if cutoff == 0 {
                    Self::None
                } else {
                    Self::LowPass { cutoff }
                })
            }
        }
    }
}

/// How the inverse transform is brought back to the input length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reconciliation {
    /// Invert over exactly the input length.
    #[default]
    ExactLength,
    /// Legacy mode: invert over `2 * (M - 1)` samples and, when that is one
    /// short (odd input length), append the last input sample unfiltered.
    AppendLastSample,
}

impl FromStr for Reconciliation {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "exact_length" => Ok(Self::ExactLength),
            "append" | "append_last_sample" | "legacy" => Ok(Self::AppendLastSample),
            other => Err(AnalyticsError::InvalidInput(format!(
                "invalid reconciliation '{}'",
                other
            ))),
        }
    }
}

/// Number of coefficients of the real transform of `len` samples.
pub fn max_cutoff(len: usize) -> usize {
    len / 2 + 1
}

/// Forward real DFT: the `len / 2 + 1` non-negative frequency coefficients.
fn real_spectrum(signal: &[f64]) -> Vec<Complex<f64>> {
    let n = signal.len();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft.process(&mut buffer);

    buffer.truncate(max_cutoff(n));
    buffer
}

/// Inverse real DFT of a half spectrum into `n_out` samples.
///
/// The negative frequencies are the conjugate mirror of the half spectrum.
/// Imaginary parts of the DC and (even `n_out`) Nyquist bins are ignored.
fn inverse_real_spectrum(spectrum: &[Complex<f64>], n_out: usize) -> Vec<f64> {
    if n_out == 0 {
        return Vec::new();
    }

    let zero = Complex::new(0.0, 0.0);
    let mut buffer: Vec<Complex<f64>> = (0..n_out)
        .map(|k| {
            let mirrored = k > n_out / 2;
            let bin = if mirrored { n_out - k } else { k };
            let c = spectrum.get(bin).copied().unwrap_or(zero);
            if bin == 0 || 2 * bin == n_out {
                Complex::new(c.re, 0.0)
            } else if mirrored {
                c.conj()
            } else {
                c
            }
        })
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let ifft = planner.plan_fft_inverse(n_out);
    ifft.process(&mut buffer);

    let scale = n_out as f64;
    buffer.iter().map(|c| c.re / scale).collect()
}

/// Low-pass filter `signal`, keeping the `cutoff` lowest frequencies.
///
/// Uses [`Reconciliation::ExactLength`].
pub fn fourier_smooth(signal: &[f64], cutoff: usize) -> Result<Vec<f64>> {
    fourier_smooth_with(signal, cutoff, Reconciliation::default())
}

/// Low-pass filter `signal` with an explicit length reconciliation policy.
///
/// # Arguments
/// * `signal` - Real-valued samples
/// * `cutoff` - Number of retained coefficients, `1..=signal.len() / 2 + 1`
/// * `reconciliation` - How the output is restored to `signal.len()`
///
/// # Errors
/// * `InsufficientData` for an empty signal
/// * `InvalidCutoff` if `cutoff` is zero or above `signal.len() / 2 + 1`
/// * `InvalidInput` if a sample is not finite
pub fn fourier_smooth_with(
    signal: &[f64],
    cutoff: usize,
    reconciliation: Reconciliation,
) -> Result<Vec<f64>> {
    let len = signal.len();
    if len == 0 {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }

    let max = max_cutoff(len);
    if cutoff == 0 || cutoff > max {
        return Err(AnalyticsError::InvalidCutoff { cutoff, max });
    }

    if let Some(pos) = signal.iter().position(|v| !v.is_finite()) {
        return Err(AnalyticsError::InvalidInput(format!(
            "non-finite value at position {}",
            pos
        )));
    }

    let mut spectrum = real_spectrum(signal);
    for c in spectrum.iter_mut().skip(cutoff) {
        *c = Complex::new(0.0, 0.0);
    }

    let n_out = match reconciliation {
        Reconciliation::AppendLastSample => 2 * (max - 1),
        Reconciliation::ExactLength => len,
    };
    let mut smoothed = inverse_real_spectrum(&spectrum, n_out);

    let appended = smoothed.len() < len;
    if appended {
        smoothed.push(signal[len - 1]);
    }

    debug!(length = len, cutoff, appended, "smoothing complete");

    Ok(smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn wave(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / len as f64;
                10.0 + 4.0 * (2.0 * PI * t).sin()
                    + 1.5 * (2.0 * PI * 5.0 * t).cos()
                    + ((i * 7 + 3) % 5) as f64 * 0.3
            })
            .collect()
    }

    #[test]
    fn test_round_trip_even_length() {
        let signal = wave(24);
        let smoothed = fourier_smooth(&signal, max_cutoff(24)).unwrap();
        assert_eq!(smoothed.len(), 24);
        for (a, b) in signal.iter().zip(smoothed.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_round_trip_odd_length_exact() {
        let signal = wave(25);
        let smoothed = fourier_smooth_with(&signal, max_cutoff(25), Reconciliation::ExactLength)
            .unwrap();
        assert_eq!(smoothed.len(), 25);
        for (a, b) in signal.iter().zip(smoothed.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_legacy_odd_length_appends_last_sample() {
        let signal = wave(25);
        let smoothed = fourier_smooth_with(&signal, 3, Reconciliation::AppendLastSample).unwrap();
        assert_eq!(smoothed.len(), 25);
        assert_eq!(smoothed[24], signal[24]);

        // Even lengths need no extra sample, so both policies agree
        let even = wave(24);
        let legacy = fourier_smooth_with(&even, 3, Reconciliation::AppendLastSample).unwrap();
        let exact = fourier_smooth(&even, 3).unwrap();
        for (a, b) in legacy.iter().zip(exact.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_odd_length_default_keeps_mean_and_round_trips() {
        let signal = [1.0, 2.0, 3.0, 4.0, 10.0];
        let smoothed = fourier_smooth(&signal, 1).unwrap();
        assert_eq!(smoothed.len(), 5);
        for v in &smoothed {
            assert_abs_diff_eq!(*v, 4.0, epsilon = 1e-9);
        }

        let signal = [1.0, 5.0, 2.0, 8.0, 3.0];
        let smoothed = fourier_smooth(&signal, max_cutoff(5)).unwrap();
        assert_eq!(smoothed.len(), 5);
        for (a, b) in signal.iter().zip(smoothed.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_yearly_cycle_dc_only_is_mean() {
        let cycle = wave(365);
        let mean = cycle.iter().sum::<f64>() / 365.0;
        let smoothed = fourier_smooth(&cycle, 1).unwrap();
        assert_eq!(smoothed.len(), 365);
        for v in &smoothed {
            assert_abs_diff_eq!(*v, mean, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_truncated_coefficients_are_zero() {
        let signal = wave(32);
        let cutoff = 4;
        let smoothed = fourier_smooth(&signal, cutoff).unwrap();

        let spectrum = real_spectrum(&smoothed);
        let original = real_spectrum(&signal);
        for (k, c) in spectrum.iter().enumerate() {
            if k >= cutoff {
                assert_abs_diff_eq!(c.norm(), 0.0, epsilon = 1e-9);
            } else {
                assert_abs_diff_eq!(c.re, original[k].re, epsilon = 1e-9);
                assert_abs_diff_eq!(c.im, original[k].im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_dc_only_is_mean() {
        let signal = wave(20);
        let mean = signal.iter().sum::<f64>() / 20.0;
        let smoothed = fourier_smooth(&signal, 1).unwrap();
        for v in &smoothed {
            assert_abs_diff_eq!(*v, mean, epsilon = 1e-9);
        }

        let odd = wave(21);
        let odd_mean = odd.iter().sum::<f64>() / 21.0;
        let smoothed = fourier_smooth(&odd, 1).unwrap();
        assert_eq!(smoothed.len(), 21);
        for v in &smoothed {
            assert_abs_diff_eq!(*v, odd_mean, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_removes_alternating_noise() {
        let clean: Vec<f64> = (0..16)
            .map(|i| 5.0 + 2.0 * (2.0 * PI * i as f64 / 16.0).cos())
            .collect();
        let noisy: Vec<f64> = clean
            .iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { v + 1.0 } else { v - 1.0 })
            .collect();

        let smoothed = fourier_smooth(&noisy, 3).unwrap();
        for (a, b) in clean.iter().zip(smoothed.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_cutoff() {
        let signal = wave(10);
        assert_eq!(
            fourier_smooth(&signal, 10),
            Err(AnalyticsError::InvalidCutoff { cutoff: 10, max: 6 })
        );
        assert_eq!(
            fourier_smooth(&signal, 0),
            Err(AnalyticsError::InvalidCutoff { cutoff: 0, max: 6 })
        );
        assert!(fourier_smooth(&signal, 6).is_ok());
    }

    #[test]
    fn test_empty_and_single_sample() {
        assert_eq!(
            fourier_smooth(&[], 1),
            Err(AnalyticsError::InsufficientData { needed: 1, got: 0 })
        );
        assert_eq!(fourier_smooth(&[3.5], 1).unwrap(), vec![3.5]);
        assert_eq!(
            fourier_smooth_with(&[3.5], 1, Reconciliation::AppendLastSample).unwrap(),
            vec![3.5]
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            fourier_smooth(&[1.0, f64::INFINITY, 2.0], 1),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_smoothing_apply() {
        let signal = wave(12);
        assert_eq!(
            Smoothing::None.apply(&signal, Reconciliation::default()),
            Ok(None)
        );
        let smoothed = Smoothing::LowPass { cutoff: 2 }
            .apply(&signal, Reconciliation::default())
            .unwrap()
            .unwrap();
        assert_eq!(smoothed.len(), 12);
        assert!(Smoothing::LowPass { cutoff: 9 }
            .apply(&signal, Reconciliation::default())
            .is_err());
    }

    #[test]
    fn test_smoothing_from_str() {
        assert_eq!("none".parse::<Smoothing>(), Ok(Smoothing::None));
        assert_eq!("0".parse::<Smoothing>(), Ok(Smoothing::None));
        assert_eq!(
            "5".parse::<Smoothing>(),
            Ok(Smoothing::LowPass { cutoff: 5 })
        );
        assert_eq!(
            "lowpass:3".parse::<Smoothing>(),
            Ok(Smoothing::LowPass { cutoff: 3 })
        );
        assert!("abc".parse::<Smoothing>().is_err());
        assert_eq!(Smoothing::from_cutoff(Some(4)).cutoff(), Some(4));
        assert_eq!(Smoothing::from_cutoff(None), Smoothing::None);
    }

    #[test]
    fn test_reconciliation_from_str() {
        assert_eq!(
            "exact".parse::<Reconciliation>().unwrap(),
            Reconciliation::ExactLength
        );
        assert_eq!(
            " Append_Last_Sample ".parse::<Reconciliation>().unwrap(),
            Reconciliation::AppendLastSample
        );
        assert_eq!(Reconciliation::default(), Reconciliation::ExactLength);
        assert!(matches!(
            "exactt".parse::<Reconciliation>(),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }
}
