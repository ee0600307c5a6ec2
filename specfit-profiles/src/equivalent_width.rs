//! Equivalent width: the integrated absorbed flux fraction of a line,
//! expressed as the width of a rectangular, fully black notch with the
//! same integral.

use crate::profile::Profile;

/// Number of quadrature subintervals used per unit of the integration span;
/// chosen generously since these evaluations are cheap single-line sums.
const SUBINTERVALS: usize = 2_000;

/// Integrate `1 - exp(-tau(x))` over `[center - half_span, center + half_span]`
/// using Simpson's rule, returning the equivalent width in the same
/// wavelength units as the profile.
pub fn equivalent_width(profile: &Profile, half_span: f64) -> f64 {
    let center = profile.center();
    let a = center - half_span;
    let b = center + half_span;
    simpson(|x| 1.0 - (-profile.optical_depth(x)).exp(), a, b, SUBINTERVALS)
}

fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
    let n = if n % 2 == 0 { n } else { n + 1 };
    let h = (b - a) / n as f64;
    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + i as f64 * h;
        sum += if i % 2 == 0 { 2.0 * f(x) } else { 4.0 * f(x) };
    }
    sum * h / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DopplerParams;

    #[test]
    fn equivalent_width_is_positive_for_an_absorption_line() {
        let profile = Profile::Doppler(DopplerParams {
            rest_wavelength: 5889.95,
            oscillator_strength: 0.65,
            redshift: 0.0,
            radial_velocity: 0.0,
            doppler_velocity: 2.0,
            log_column_density: 13.0,
        });
        let ew = equivalent_width(&profile, 5.0);
        assert!(ew > 0.0);
    }

    #[test]
    fn equivalent_width_grows_with_column_density() {
        let weak = Profile::Doppler(DopplerParams {
            rest_wavelength: 5889.95,
            oscillator_strength: 0.65,
            redshift: 0.0,
            radial_velocity: 0.0,
            doppler_velocity: 2.0,
            log_column_density: 11.0,
        });
        let strong = Profile::Doppler(DopplerParams {
            rest_wavelength: 5889.95,
            oscillator_strength: 0.65,
            redshift: 0.0,
            radial_velocity: 0.0,
            doppler_velocity: 2.0,
            log_column_density: 14.0,
        });
        assert!(equivalent_width(&strong, 5.0) > equivalent_width(&weak, 5.0));
    }
}
