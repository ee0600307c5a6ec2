//! Absorption line variants: Doppler, many-multiplet, and Voigt profiles,
//! each a closed-form optical-depth contribution from a single transition.

use crate::constants::{MICRO, OSCILLATOR_PREFACTOR, SPEED_OF_LIGHT_KM_S, TRUNCATION_WIDTH};
use crate::kernels::{gaussian, truncate};
use crate::voigt::PseudoVoigt;

/// Parameters of an intergalactic Doppler line: rest wavelength, oscillator
/// strength, redshift, peculiar velocity, broadening velocity, and the
/// base-10 logarithm of the column density.
#[derive(Debug, Clone, Copy)]
pub struct DopplerParams {
    pub rest_wavelength: f64,
    pub oscillator_strength: f64,
    pub redshift: f64,
    pub radial_velocity: f64,
    pub doppler_velocity: f64,
    pub log_column_density: f64,
}

/// Parameters of a many-multiplet line, adding a relativistic sensitivity
/// coefficient `q` and a fine-structure-constant variation Δα/α (in units
/// of 10^-6) to the Doppler parameter set.
#[derive(Debug, Clone, Copy)]
pub struct ManyMultipletParams {
    pub rest_wavelength: f64,
    pub oscillator_strength: f64,
    pub redshift: f64,
    pub radial_velocity: f64,
    pub doppler_velocity: f64,
    pub log_column_density: f64,
    pub relativistic_coefficient: f64,
    pub delta_alpha_over_alpha: f64,
}

/// Parameters of an intergalactic Voigt line: the Doppler set plus a
/// natural damping constant `gamma` (s^-1).
#[derive(Debug, Clone, Copy)]
pub struct VoigtParams {
    pub rest_wavelength: f64,
    pub oscillator_strength: f64,
    pub redshift: f64,
    pub radial_velocity: f64,
    pub doppler_velocity: f64,
    pub log_column_density: f64,
    pub damping_constant: f64,
}

fn redshift_factor(redshift: f64, radial_velocity: f64) -> f64 {
    (1.0 + redshift) * (1.0 + radial_velocity / SPEED_OF_LIGHT_KM_S)
}

/// A single absorbing transition, dispatched over the three supported
/// profile shapes. Using an enum here (rather than the generic profile
/// templates of the original design) keeps the evaluator free of dynamic
/// dispatch while letting `Section` hold a homogeneous list of lines.
#[derive(Debug, Clone, Copy)]
pub enum Profile {
    Doppler(DopplerParams),
    ManyMultiplet(ManyMultipletParams),
    Voigt(VoigtParams),
}

impl Profile {
    /// Number of free parameters this variant exposes.
    pub fn parameter_count(&self) -> usize {
        match self {
            Profile::Doppler(_) => 6,
            Profile::ManyMultiplet(_) => 8,
            Profile::Voigt(_) => 7,
        }
    }

    /// Combined cosmological-redshift and peculiar-velocity Doppler factor
    /// `(1+z)(1+v_r/c)` applied to this line's rest-frame wavelength.
    pub fn redshift_factor(&self) -> f64 {
        match self {
            Profile::Doppler(p) => redshift_factor(p.redshift, p.radial_velocity),
            Profile::ManyMultiplet(p) => redshift_factor(p.redshift, p.radial_velocity),
            Profile::Voigt(p) => redshift_factor(p.redshift, p.radial_velocity),
        }
    }

    /// Observed-frame line center.
    pub fn center(&self) -> f64 {
        match self {
            Profile::Doppler(p) => p.rest_wavelength * redshift_factor(p.redshift, p.radial_velocity),
            Profile::Voigt(p) => p.rest_wavelength * redshift_factor(p.redshift, p.radial_velocity),
            Profile::ManyMultiplet(p) => {
                let u = many_multiplet_effective_wavelength(p);
                u * redshift_factor(p.redshift, p.radial_velocity)
            }
        }
    }

    /// Optical depth contributed by this line at observed wavelength `x`.
    pub fn optical_depth(&self, x: f64) -> f64 {
        match self {
            Profile::Doppler(p) => {
                let z = redshift_factor(p.redshift, p.radial_velocity);
                let center = p.rest_wavelength * z;
                let width = p.doppler_velocity * center / SPEED_OF_LIGHT_KM_S;
                let amplitude = OSCILLATOR_PREFACTOR
                    * p.oscillator_strength
                    * 10f64.powf(p.log_column_density)
                    * (p.rest_wavelength * center);
                amplitude * truncate(gaussian, x - center, width, TRUNCATION_WIDTH)
            }
            Profile::ManyMultiplet(p) => {
                let u = many_multiplet_effective_wavelength(p);
                let z = redshift_factor(p.redshift, p.radial_velocity);
                let center = u * z;
                let width = p.doppler_velocity * center / SPEED_OF_LIGHT_KM_S;
                let amplitude = OSCILLATOR_PREFACTOR
                    * p.oscillator_strength
                    * 10f64.powf(p.log_column_density)
                    * (u * center);
                amplitude * truncate(gaussian, x - center, width, TRUNCATION_WIDTH)
            }
            Profile::Voigt(p) => {
                let z = redshift_factor(p.redshift, p.radial_velocity);
                let center = p.rest_wavelength * z;
                let gaussian_width = p.doppler_velocity * center / SPEED_OF_LIGHT_KM_S;
                // Natural linewidth expressed as a wavelength HWHM via
                // the standard damping-constant relation Δλ = λ^2 Γ / (4π c).
                let lorentzian_width =
                    center * center * p.damping_constant / (4.0 * std::f64::consts::PI * crate::constants::SPEED_OF_LIGHT_M_S) * 1.0e-10;
                let amplitude = OSCILLATOR_PREFACTOR
                    * p.oscillator_strength
                    * 10f64.powf(p.log_column_density)
                    * (p.rest_wavelength * center);
                let shape = PseudoVoigt::new(gaussian_width, lorentzian_width.max(1e-12));
                amplitude * truncate(|dx, _gamma| shape.evaluate(dx), x - center, gaussian_width, TRUNCATION_WIDTH)
            }
        }
    }
}

fn many_multiplet_effective_wavelength(p: &ManyMultipletParams) -> f64 {
    let wavenumber = 1.0e8 / p.rest_wavelength;
    let delta = p.delta_alpha_over_alpha * MICRO;
    1.0e8 / (wavenumber + p.relativistic_coefficient * delta * (delta + 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doppler_profile_peaks_at_center() {
        let params = DopplerParams {
            rest_wavelength: 5889.95,
            oscillator_strength: 0.65,
            redshift: 0.0,
            radial_velocity: 0.0,
            doppler_velocity: 2.0,
            log_column_density: 13.0,
        };
        let profile = Profile::Doppler(params);
        let center = profile.center();
        assert!(profile.optical_depth(center) > profile.optical_depth(center + 1.0));
        assert!(profile.optical_depth(center) > 0.0);
    }

    #[test]
    fn many_multiplet_reduces_to_doppler_when_alpha_unchanged() {
        let params = ManyMultipletParams {
            rest_wavelength: 5889.95,
            oscillator_strength: 0.65,
            redshift: 0.0,
            radial_velocity: 0.0,
            doppler_velocity: 2.0,
            log_column_density: 13.0,
            relativistic_coefficient: 1000.0,
            delta_alpha_over_alpha: 0.0,
        };
        let profile = Profile::ManyMultiplet(params);
        assert!((profile.center() - 5889.95).abs() < 1e-6);
    }

    #[test]
    fn voigt_profile_has_wider_wings_than_pure_doppler() {
        let doppler = Profile::Doppler(DopplerParams {
            rest_wavelength: 1215.67,
            oscillator_strength: 0.4164,
            redshift: 2.0,
            radial_velocity: 0.0,
            doppler_velocity: 20.0,
            log_column_density: 14.0,
        });
        let voigt = Profile::Voigt(VoigtParams {
            rest_wavelength: 1215.67,
            oscillator_strength: 0.4164,
            redshift: 2.0,
            radial_velocity: 0.0,
            doppler_velocity: 20.0,
            log_column_density: 14.0,
            damping_constant: 6.265e8,
        });
        let center = doppler.center();
        let far = center + 8.0 * doppler.center() * 20.0 / SPEED_OF_LIGHT_KM_S;
        assert!(voigt.optical_depth(far) >= doppler.optical_depth(far));
    }
}
