//! Fourier-domain resampling.

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::cell::RefCell;

thread_local! {
    static PLANNER: RefCell<RealFftPlanner<f64>> = RefCell::new(RealFftPlanner::new());
}

/// Resample `data` to `num` points through the frequency domain.
///
/// The spectrum is truncated or zero-padded to the target length; the
/// Nyquist bin is folded when shortening and split when lengthening so
/// the result stays real-valued. Equivalent to band-limited
/// interpolation of the input.
pub fn resample(data: &[f64], num: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 || num == 0 {
        return Vec::new();
    }
    if num == n {
        return data.to_vec();
    }
    if n == 1 {
        return vec![data[0]; num];
    }

    let (fft, ifft) = PLANNER.with(|planner| {
        let mut planner = planner.borrow_mut();
        (planner.plan_fft_forward(n), planner.plan_fft_inverse(num))
    });

    let mut input = data.to_vec();
    let mut spectrum = fft.make_output_vec();
    fft.process(&mut input, &mut spectrum).expect("FFT failed");

    let mut out_spec = vec![Complex::new(0.0, 0.0); num / 2 + 1];
    let n_min = n.min(num);
    let nyq = n_min / 2 + 1;
    out_spec[..nyq].copy_from_slice(&spectrum[..nyq]);

    // Nyquist component: fold its conjugate partner in when the series
    // shrinks, split it across the pair when the series grows.
    if n_min % 2 == 0 {
        let k = n_min / 2;
        if num < n {
            out_spec[k] = Complex::new(out_spec[k].re * 2.0, 0.0);
        } else {
            out_spec[k] *= 0.5;
        }
    }
    out_spec[0].im = 0.0;

    let mut out = ifft.make_output_vec();
    ifft.process(&mut out_spec, &mut out).expect("FFT failed");
    let scale = 1.0 / n as f64;
    out.iter().map(|v| v * scale).collect()
}
