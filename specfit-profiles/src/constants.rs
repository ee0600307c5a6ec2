//! Physical and mathematical constants shared by the profile formulas.

/// sqrt(ln 2), the scale factor between a Gaussian HWHM and its 1/e width.
pub const SQRT_LN_2: f64 = 0.832_554_611_157_698;

/// Speed of light in vacuum, in m/s.
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Speed of light in km/s, the unit broadening velocities are specified in.
pub const SPEED_OF_LIGHT_KM_S: f64 = 1.0e-3 * SPEED_OF_LIGHT_M_S;

/// 10^-6, converting cm^-1 sensitivity coefficients to SI-adjacent units.
pub const MICRO: f64 = 1.0e-6;

/// Elementary charge, in C.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Vacuum permittivity, in F/m.
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_8128e-12;

/// Electron mass, in kg.
pub const ELECTRON_MASS: f64 = 9.109_383_7015e-31;

/// Prefactor converting oscillator strength and column density into an
/// optical-depth amplitude: `e^2 / (4 eps0 me c^2)`, scaled by 10^-6.
pub const OSCILLATOR_PREFACTOR: f64 = MICRO
    * (ELEMENTARY_CHARGE * ELEMENTARY_CHARGE)
    / (4.0 * VACUUM_PERMITTIVITY * ELECTRON_MASS * SPEED_OF_LIGHT_M_S * SPEED_OF_LIGHT_M_S);

/// Number of Gaussian half-widths at which a kernel is truncated to zero.
pub const TRUNCATION_WIDTH: f64 = 4.0;
