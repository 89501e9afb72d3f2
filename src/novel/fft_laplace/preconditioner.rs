//! Fourier-domain resolvent of the periodic grid Laplacian.

use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::matrix::SquareMatrix;

/// Applies `(I + τ·L)⁻¹` to `n×n` matrices, where `L` is the 5-point
/// Laplacian on the `n×n` torus.
///
/// The eigenvalue of `L` at frequency `(k, l)` is
/// `4·sin²(πk/n) + 4·sin²(πl/n)`. The zero frequency passes unchanged, so
/// the map preserves row and column sums: tangent directions stay tangent.
#[derive(Clone)]
pub struct LaplacePreconditioner {
    n: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    /// Multiplier per frequency, already divided by `n²` for the
    /// unnormalised inverse transform.
    gain: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl LaplacePreconditioner {
    pub fn new(n: usize, tau: f64) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        let eig: Vec<f64> = (0..n)
            .map(|k| {
                let s = (std::f64::consts::PI * k as f64 / n as f64).sin();
                4.0 * s * s
            })
            .collect();
        let norm = 1.0 / (n * n) as f64;
        let mut gain = Vec::with_capacity(n * n);
        for &ek in &eig {
            for &el in &eig {
                gain.push(norm / (1.0 + tau * (ek + el)));
            }
        }

        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            n,
            forward,
            inverse,
            gain,
            buffer: vec![Complex::new(0.0, 0.0); n * n],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Smooths `g` in place.
    pub fn apply(&mut self, g: &mut SquareMatrix) {
        debug_assert_eq!(g.size(), self.n);
        for (b, &v) in self.buffer.iter_mut().zip(g.iter()) {
            *b = Complex::new(v, 0.0);
        }

        // Rows, then columns (via transpose), forward.
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        transpose(&mut self.buffer, self.n);
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        // The gain is symmetric in (k, l), so the transposed layout is fine.
        for (b, &w) in self.buffer.iter_mut().zip(&self.gain) {
            *b *= w;
        }

        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        transpose(&mut self.buffer, self.n);
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (v, b) in g.iter_mut().zip(&self.buffer) {
            *v = b.re;
        }
    }
}

impl fmt::Debug for LaplacePreconditioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaplacePreconditioner")
            .field("n", &self.n)
            .finish_non_exhaustive()
    }
}

fn transpose(buf: &mut [Complex<f64>], n: usize) {
    for i in 0..n {
        for j in (i + 1)..n {
            buf.swap(i * n + j, j * n + i);
        }
    }
}
