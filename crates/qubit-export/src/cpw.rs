//! Coplanar waveguide line parameters
//!
//! Conformal-mapping model of a CPW on a finite-thickness substrate. The
//! effective permittivity it returns is what the 2-D FasterCap deck takes
//! as the medium around a conductor.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Complete elliptic integral of the first kind K(k), `k` being the modulus
pub fn elliptic_k(k: f64) -> f64 {
    let mut a = 1.0_f64;
    let mut b = (1.0 - k * k).sqrt();
    // AGM converges quadratically; a few dozen rounds covers k -> 1
    for _ in 0..64 {
        if (a - b).abs() <= f64::EPSILON * a {
            break;
        }
        let next = (a + b) / 2.0;
        b = (a * b).sqrt();
        a = next;
    }
    std::f64::consts::PI / (2.0 * a)
}

fn complement(k: f64) -> f64 {
    (1.0 - k * k).sqrt()
}

/// Center strip of width `width`, separated by `gap` from the ground planes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoplanarWaveguide {
    /// Relative permittivity of the substrate
    pub substrate_permittivity: f64,
    /// Substrate thickness (same length unit as `width` and `gap`)
    pub substrate_height: f64,
    pub width: f64,
    pub gap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpwProperties {
    /// Characteristic impedance (Ω)
    pub impedance: f64,
    /// Effective relative permittivity
    pub effective_permittivity: f64,
}

impl CoplanarWaveguide {
    pub fn properties(&self) -> Result<CpwProperties> {
        for (name, value) in [
            ("substrate height", self.substrate_height),
            ("width", self.width),
            ("gap", self.gap),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ExportError::InvalidParameter(format!(
                    "CPW {} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.substrate_permittivity >= 1.0) {
            return Err(ExportError::InvalidParameter(format!(
                "substrate permittivity must be at least 1, got {}",
                self.substrate_permittivity
            )));
        }

        let w = self.width;
        let s = self.gap;
        let h = self.substrate_height;
        let quarter_pi = std::f64::consts::PI / 4.0;

        let k0 = w / (w + 2.0 * s);
        let k1 = (quarter_pi * w / h).sinh() / (quarter_pi * (w + 2.0 * s) / h).sinh();

        let ratio0 = elliptic_k(complement(k0)) / elliptic_k(k0);
        let ratio1 = elliptic_k(k1) / elliptic_k(complement(k1));

        let effective_permittivity = 1.0 + (self.substrate_permittivity - 1.0) / 2.0 * ratio1 * ratio0;
        let impedance = 30.0 * std::f64::consts::PI / effective_permittivity.sqrt() * ratio0;

        Ok(CpwProperties {
            impedance,
            effective_permittivity,
        })
    }
}

/// Frequency (Hz) of a wave with the given wavelength (m) in a medium of `epsilon_e`
pub fn wavelength_to_frequency(wavelength: f64, epsilon_e: f64) -> f64 {
    SPEED_OF_LIGHT / epsilon_e.sqrt() / wavelength
}

/// Wavelength (m) of a wave with the given frequency (Hz) in a medium of `epsilon_e`
pub fn frequency_to_wavelength(frequency: f64, epsilon_e: f64) -> f64 {
    SPEED_OF_LIGHT / epsilon_e.sqrt() / frequency
}
