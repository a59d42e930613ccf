//! Linear-prediction numerics used by the primary formant backend.
//!
//! Everything here is a pure function over slices.  The only state is the
//! `FftPlanner` that callers pass to [`fft_resample`] so plans are reused
//! across frames.

use std::f64::consts::PI;

use num_complex::{Complex32, Complex64};
use rustfft::FftPlanner;

/// Rate the LPC analysis runs at; formants above 5 kHz are not of interest.
pub const PROC_SAMPLE_RATE: u32 = 10_000;
/// Prediction order (≈ sr/1000 + 2 at 10 kHz).
pub const LPC_ORDER: usize = 12;
pub const PREEMPH_COEF: f32 = 0.97;
pub const FORMANT_FMIN_HZ: f64 = 90.0;
pub const FORMANT_FMAX_HZ: f64 = 5000.0;
pub const FORMANT_BW_MAX_HZ: f64 = 1000.0;

const ROOT_MAX_ITER: usize = 200;
const ROOT_TOL: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Pre-processing
// ---------------------------------------------------------------------------

/// Band-limited resampling to `out_len` samples by zero-padding or
/// truncating the spectrum.
///
/// The Nyquist bin is dropped rather than split, so the output carries no
/// energy at exactly half the new rate.
pub fn fft_resample(x: &[f32], out_len: usize, planner: &mut FftPlanner<f32>) -> Vec<f32> {
    let in_len = x.len();
    if in_len == 0 || out_len == 0 {
        return Vec::new();
    }
    if in_len == out_len {
        return x.to_vec();
    }

    let fft = planner.plan_fft_forward(in_len);
    let ifft = planner.plan_fft_inverse(out_len);

    let mut spectrum: Vec<Complex32> = x.iter().map(|&s| Complex32::new(s, 0.0)).collect();
    fft.process(&mut spectrum);

    let mut out = vec![Complex32::new(0.0, 0.0); out_len];
    out[0] = spectrum[0];
    let k_max = (in_len / 2).min(out_len / 2);
    for k in 1..k_max {
        out[k] = spectrum[k];
        out[out_len - k] = spectrum[in_len - k];
    }

    ifft.process(&mut out);

    let scale = 1.0 / in_len as f32;
    out.iter().map(|c| c.re * scale).collect()
}

/// `y[n] = x[n] - coef·x[n-1]`, first sample unchanged.
pub fn pre_emphasis(x: &[f32], coef: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(x.len());
    let mut prev = 0.0f32;
    for (i, &s) in x.iter().enumerate() {
        out.push(if i == 0 { s } else { s - coef * prev });
        prev = s;
    }
    out
}

pub fn hamming_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| (0.54 - 0.46 * (2.0 * PI * i as f64 / (n as f64 - 1.0)).cos()) as f32)
        .collect()
}

// ---------------------------------------------------------------------------
// Linear prediction
// ---------------------------------------------------------------------------

/// Mean-removed autocorrelation for lags `0..=max_lag`.
pub fn autocorrelation(x: &[f32], max_lag: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return vec![0.0; max_lag + 1];
    }
    let mean = x.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let centred: Vec<f64> = x.iter().map(|&v| v as f64 - mean).collect();

    (0..=max_lag)
        .map(|lag| {
            if lag >= n {
                0.0
            } else {
                centred[..n - lag]
                    .iter()
                    .zip(&centred[lag..])
                    .map(|(a, b)| a * b)
                    .sum()
            }
        })
        .collect()
}

/// Levinson–Durbin recursion.
///
/// Returns the prediction polynomial `[1, a1, …, a_order]` and the final
/// prediction error, or `None` when the recursion goes unstable.
pub fn levinson_durbin(r: &[f64], order: usize) -> Option<(Vec<f64>, f64)> {
    if r.len() < order + 1 || r[0] <= 0.0 {
        return None;
    }

    let mut a = vec![0.0f64; order + 1];
    a[0] = 1.0;
    let mut err = r[0];

    for i in 1..=order {
        let acc = r[i] + (1..i).map(|j| a[j] * r[i - j]).sum::<f64>();
        let k = -acc / err;
        let prev = a.clone();
        a[i] = k;
        for j in 1..i {
            a[j] = prev[j] + k * prev[i - j];
        }
        err *= 1.0 - k * k;
        if err <= 0.0 || !err.is_finite() {
            return None;
        }
    }

    Some((a, err))
}

/// Evaluate `a[0]·z^n + a[1]·z^(n-1) + … + a[n]` by Horner's rule.
pub fn poly_eval(a: &[f64], z: Complex64) -> Complex64 {
    a.iter()
        .skip(1)
        .fold(Complex64::new(a[0], 0.0), |acc, &c| acc * z + c)
}

/// All complex roots of the polynomial whose coefficients (leading first)
/// are `a`, by Durand–Kerner iteration.
pub fn durand_kerner_roots(a: &[f64]) -> Vec<Complex64> {
    let n = a.len().saturating_sub(1);
    if n == 0 || a[0] == 0.0 {
        return Vec::new();
    }
    let monic: Vec<f64> = a.iter().map(|c| c / a[0]).collect();

    // Powers of a non-real seed keep the guesses off the real axis.
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..n).map(|k| seed.powu(k as u32)).collect();

    for _ in 0..ROOT_MAX_ITER {
        let mut max_step = 0.0f64;
        for i in 0..n {
            let denom = (0..n)
                .filter(|&j| j != i)
                .fold(Complex64::new(1.0, 0.0), |acc, j| acc * (roots[i] - roots[j]));
            let step = if denom.norm() < 1e-14 {
                Complex64::new(1e-6, 1e-6)
            } else {
                poly_eval(&monic, roots[i]) / denom
            };
            roots[i] -= step;
            max_step = max_step.max(step.norm());
        }
        if max_step < ROOT_TOL {
            break;
        }
    }

    roots
}

/// A resonance derived from one LPC pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resonance {
    pub frequency: f64,
    pub bandwidth: f64,
}

/// Convert the prediction polynomial's poles into resonances, lowest first.
///
/// Only poles in the upper half plane inside the unit circle with
/// `FORMANT_FMIN_HZ < f < FORMANT_FMAX_HZ` and bandwidth below
/// `FORMANT_BW_MAX_HZ` are kept.
pub fn resonances(a: &[f64], rate: f64) -> Vec<Resonance> {
    let mut found: Vec<Resonance> = durand_kerner_roots(a)
        .into_iter()
        .filter(|z| z.im > 0.0 && z.norm() < 1.0)
        .map(|z| Resonance {
            frequency: z.arg() * rate / (2.0 * PI),
            bandwidth: -(rate / PI) * z.norm().ln(),
        })
        .filter(|r| {
            r.frequency > FORMANT_FMIN_HZ
                && r.frequency < FORMANT_FMAX_HZ
                && r.bandwidth < FORMANT_BW_MAX_HZ
        })
        .collect();
    found.sort_by(|x, y| x.frequency.total_cmp(&y.frequency));
    found
}

/// Level of the all-pole envelope `1/|A(e^{jω})|` at `frequency`, in dB.
pub fn envelope_db(a: &[f64], frequency: f64, rate: f64) -> f64 {
    let omega = 2.0 * PI * frequency / rate;
    let z_inv = Complex64::from_polar(1.0, -omega);
    let response = a
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z_inv + c);
    -20.0 * response.norm().max(1e-12).log10()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
