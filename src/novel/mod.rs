//! Novel solver family: continuous relaxations over the Birkhoff polytope.
//!
//! Every method here updates a doubly-stochastic iterate; the orchestrator
//! re-projects it after each step and rounds it to a permutation for
//! scoring. Shared building blocks (normalised gradients, tangent-space
//! projection, perturbation) live in a private `relax` module.
//!
//! | Name | Update |
//! |---|---|
//! | `fft_laplace` | Laplacian-smoothed gradient with momentum |
//! | `reverse_time_saddle` | descent with perturbed reverse-time escapes |
//! | `attractor_programming` | population of descents with best-of replacement |
//! | `entropic_mirror` | exponentiated gradient + Sinkhorn |
//! | `homotopy_continuation` | descent on a concave path toward vertices |

pub mod attractor;
pub mod fft_laplace;
pub mod homotopy;
pub mod mirror;
mod relax;
pub mod saddle;

pub use attractor::{AttractorConfig, AttractorProgramming};
pub use fft_laplace::{FftLaplace, LaplaceConfig};
pub use homotopy::{HomotopyConfig, HomotopyContinuation};
pub use mirror::{EntropicMirror, MirrorConfig};
pub use saddle::{ReverseTimeSaddle, SaddleConfig};

use crate::registry::MethodRegistry;

/// Registers every novel method.
pub fn register_all(registry: &mut MethodRegistry) {
    registry.register_method::<FftLaplace>();
    registry.register_method::<ReverseTimeSaddle>();
    registry.register_method::<AttractorProgramming>();
    registry.register_method::<EntropicMirror>();
    registry.register_method::<HomotopyContinuation>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Family;

    #[test]
    fn test_register_all() {
        let mut r = MethodRegistry::new();
        register_all(&mut r);
        assert_eq!(r.len(), 5);
        assert!(r.by_family(Family::Novel).len() == 5);
        for name in r.names() {
            let d = r.lookup(name).unwrap();
            assert!(d.instantiate(&d.default_parameters()).is_ok(), "{name}");
        }
    }
}
