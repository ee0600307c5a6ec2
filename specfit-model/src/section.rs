//! Section evaluator: convolves a superposed line profile with the
//! instrumental response, solves the inner linear problem for the
//! background continuum, and reduces everything to a residual cost.
//!
//! Cost evaluation never mutates a `Section`'s stored arrays; `evaluate`
//! takes `&self` and returns a fresh [`SectionEvaluation`] built from
//! function-local scratch, so many threads can evaluate the same section
//! concurrently. Only [`Section::apply`] writes the derived arrays back,
//! and it is only ever called once, after optimisation finishes.

use ndarray::{Array1, Array2};
use specfit_profiles::constants::SQRT_LN_2;
use specfit_profiles::{DopplerParams, ManyMultipletParams, Profile, Superposition, VoigtParams};

use crate::error::{ModelError, ModelResult};

/// Finite cost substituted for a section whose continuum normal equations
/// are singular, per the large-penalty policy documented in the design
/// ledger: the optimiser treats this exactly like any other high-cost
/// point rather than aborting the run.
pub const SINGULAR_CONTINUUM_PENALTY: f64 = 1.0e8;

/// Number of instrumental HWHMs beyond which the convolution kernel is
/// truncated to zero.
const KERNEL_TRUNCATION_HWHM: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Doppler,
    ManyMultiplet,
    Voigt,
}

impl ProfileKind {
    pub fn arity(self) -> usize {
        match self {
            ProfileKind::Doppler => 6,
            ProfileKind::ManyMultiplet => 8,
            ProfileKind::Voigt => 7,
        }
    }
}

/// One absorption line within a section: its profile variant plus the
/// indices into the parameter space's value array supplying its `arity()`
/// parameters, in the table order given in the data model.
#[derive(Debug, Clone)]
pub struct LineSpec {
    pub id: String,
    pub kind: ProfileKind,
    pub slots: Vec<usize>,
}

impl LineSpec {
    fn build(&self, values: &[f64]) -> Profile {
        let v = |k: usize| values[self.slots[k]];
        match self.kind {
            ProfileKind::Doppler => Profile::Doppler(DopplerParams {
                rest_wavelength: v(0),
                oscillator_strength: v(1),
                redshift: v(2),
                radial_velocity: v(3),
                doppler_velocity: v(4),
                log_column_density: v(5),
            }),
            ProfileKind::ManyMultiplet => Profile::ManyMultiplet(ManyMultipletParams {
                rest_wavelength: v(0),
                oscillator_strength: v(1),
                redshift: v(2),
                radial_velocity: v(3),
                doppler_velocity: v(4),
                log_column_density: v(5),
                relativistic_coefficient: v(6),
                delta_alpha_over_alpha: v(7),
            }),
            ProfileKind::Voigt => Profile::Voigt(VoigtParams {
                rest_wavelength: v(0),
                oscillator_strength: v(1),
                redshift: v(2),
                radial_velocity: v(3),
                doppler_velocity: v(4),
                log_column_density: v(5),
                damping_constant: v(6),
            }),
        }
    }
}

/// A contiguous wavelength range with observed data and the lines fit
/// within it. Only `apply` mutates the derived arrays; `evaluate` and
/// `cost` read the parameter space's values array and nothing else.
#[derive(Debug, Clone)]
pub struct Section {
    pub id: String,
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
    pub uncertainty: Vec<f64>,
    pub mask: Vec<bool>,
    pub continuum_order: usize,
    pub resolution_slot: usize,
    pub lines: Vec<LineSpec>,

    pub optical_depth: Vec<f64>,
    pub transmittance: Vec<f64>,
    pub convolved: Vec<f64>,
    pub continuum: Vec<f64>,
    pub model_flux: Vec<f64>,
    pub residual: Vec<f64>,
}

/// Result of evaluating a section at a point, kept separate from the
/// section's own storage so concurrent evaluations never alias.
#[derive(Debug, Clone)]
pub struct SectionEvaluation {
    pub optical_depth: Vec<f64>,
    pub transmittance: Vec<f64>,
    pub convolved: Vec<f64>,
    pub continuum: Vec<f64>,
    pub model_flux: Vec<f64>,
    pub residual: Vec<f64>,
    pub cost: f64,
    pub continuum_singular: bool,
}

impl Section {
    pub fn new(
        id: String,
        wavelength: Vec<f64>,
        flux: Vec<f64>,
        uncertainty: Vec<f64>,
        mask: Vec<bool>,
        continuum_order: usize,
        resolution_slot: usize,
        lines: Vec<LineSpec>,
    ) -> ModelResult<Self> {
        let n = wavelength.len();
        if flux.len() != n || uncertainty.len() != n || mask.len() != n {
            return Err(ModelError::InvalidModel(format!(
                "section '{id}': wavelength/flux/uncertainty/mask arrays must have equal length"
            )));
        }
        for w in wavelength.windows(2) {
            if w[1] <= w[0] {
                return Err(ModelError::InvalidModel(format!(
                    "section '{id}': wavelengths must be strictly increasing"
                )));
            }
        }
        for i in 0..n {
            if mask[i] && uncertainty[i] <= 0.0 {
                return Err(ModelError::InvalidModel(format!(
                    "section '{id}': uncertainty must be > 0 at masked sample {i}"
                )));
            }
        }
        Ok(Section {
            id,
            optical_depth: vec![0.0; n],
            transmittance: vec![1.0; n],
            convolved: vec![1.0; n],
            continuum: vec![1.0; n],
            model_flux: vec![1.0; n],
            residual: vec![0.0; n],
            wavelength,
            flux,
            uncertainty,
            mask,
            continuum_order,
            resolution_slot,
            lines,
        })
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn superposition(&self, values: &[f64]) -> Superposition {
        let mut sup = Superposition::new();
        for line in &self.lines {
            sup.push(line.build(values));
        }
        sup
    }

    /// Stage 1 through 3 of the cost computation, described in full at the
    /// module level: convolve, solve for the continuum, reduce to residuals.
    pub fn evaluate(&self, values: &[f64]) -> SectionEvaluation {
        let sup = self.superposition(values);
        let optical_depth: Vec<f64> = self.wavelength.iter().map(|&x| sup.optical_depth(x)).collect();
        let transmittance: Vec<f64> = optical_depth.iter().map(|&t| (-t).exp()).collect();

        let resolving_power = values[self.resolution_slot];
        let convolved = convolve(&self.wavelength, &transmittance, resolving_power);

        let (continuum, continuum_singular) =
            match solve_continuum(&self.wavelength, &self.flux, &self.uncertainty, &self.mask, &convolved, self.continuum_order) {
                Ok(coefficients) => (evaluate_continuum(&self.wavelength, &coefficients), false),
                Err(()) => (vec![1.0; self.len()], true),
            };

        let model_flux: Vec<f64> = convolved.iter().zip(&continuum).map(|(&t, &c)| c * t).collect();
        let residual: Vec<f64> = (0..self.len())
            .map(|i| (self.flux[i] - model_flux[i]) / self.uncertainty[i])
            .collect();

        let cost = if continuum_singular {
            SINGULAR_CONTINUUM_PENALTY
        } else {
            0.5 * (0..self.len())
                .filter(|&i| self.mask[i])
                .map(|i| residual[i] * residual[i])
                .sum::<f64>()
        };

        SectionEvaluation { optical_depth, transmittance, convolved, continuum, model_flux, residual, cost, continuum_singular }
    }

    pub fn cost(&self, values: &[f64]) -> f64 {
        self.evaluate(values).cost
    }

    /// Write the derived arrays back into section storage. Called once,
    /// after optimisation, never during cost evaluation.
    pub fn apply(&mut self, values: &[f64]) {
        let eval = self.evaluate(values);
        self.optical_depth = eval.optical_depth;
        self.transmittance = eval.transmittance;
        self.convolved = eval.convolved;
        self.continuum = eval.continuum;
        self.model_flux = eval.model_flux;
        self.residual = eval.residual;
    }
}

fn primitive_p(s: f64, h: f64) -> f64 {
    0.5 * libm::erf(s * SQRT_LN_2 / h)
}

fn primitive_q(s: f64, h: f64) -> f64 {
    let arg = s * SQRT_LN_2 / h;
    -(h / (2.0 * (std::f64::consts::PI * std::f64::consts::LN_2).sqrt())) * (-arg * arg).exp()
}

/// Convolve a piecewise-linear signal with a Gaussian of half-width-at-half-
/// maximum `h`, analytically per grid interval.
///
/// On interval `[l0, l1]` the signal is `a + b*lambda`; substituting
/// `s = lambda - x` turns the convolution integral into
/// `(a + b*x) * [P(s1) - P(s0)] + b * [Q(s1) - Q(s0)]`, where `P` is the
/// antiderivative of the kernel and `Q` the antiderivative of `s` times the
/// kernel. Intervals outside the truncated kernel support are skipped.
fn convolve(wavelength: &[f64], signal: &[f64], resolving_power: f64) -> Vec<f64> {
    let n = wavelength.len();
    let mut out = vec![0.0; n];
    for (i, &x) in wavelength.iter().enumerate() {
        let h = x / (2.0 * resolving_power * 1000.0);
        if !(h > 0.0) || !h.is_finite() {
            out[i] = signal[i];
            continue;
        }
        let window = KERNEL_TRUNCATION_HWHM * h;
        let lo = x - window;
        let hi = x + window;
        let start = wavelength.partition_point(|&l| l < lo).saturating_sub(1);
        let end = wavelength.partition_point(|&l| l <= hi).min(n.saturating_sub(1)).max(start);

        let mut acc = 0.0;
        for k in start..end {
            let (l0, l1) = (wavelength[k], wavelength[k + 1]);
            let (t0, t1) = (signal[k], signal[k + 1]);
            let b = (t1 - t0) / (l1 - l0);
            let a = t0 - b * l0;
            let s0 = l0 - x;
            let s1 = l1 - x;
            acc += (a + b * x) * (primitive_p(s1, h) - primitive_p(s0, h)) + b * (primitive_q(s1, h) - primitive_q(s0, h));
        }
        out[i] = acc;
    }
    out
}

/// Legendre polynomials `L_0..L_{m-1}` at `u`, via Bonnet's recursion.
fn legendre_basis(m: usize, u: f64) -> Vec<f64> {
    let mut l = vec![0.0; m];
    if m == 0 {
        return l;
    }
    l[0] = 1.0;
    if m > 1 {
        l[1] = u;
    }
    for j in 1..m.saturating_sub(1) {
        l[j + 1] = ((2 * j + 1) as f64 * u * l[j] - j as f64 * l[j - 1]) / (j + 1) as f64;
    }
    l
}

fn cholesky_decompose(a: &Array2<f64>) -> Option<Array2<f64>> {
    let m = a.nrows();
    let mut l = Array2::<f64>::zeros((m, m));
    for i in 0..m {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

fn solve_lower(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let m = l.nrows();
    let mut y = Array1::zeros(m);
    for i in 0..m {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    y
}

fn solve_upper_transpose(l: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
    let m = l.nrows();
    let mut x = Array1::zeros(m);
    for i in (0..m).rev() {
        let mut sum = y[i];
        for k in (i + 1)..m {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

fn solve_continuum(
    wavelength: &[f64],
    flux: &[f64],
    uncertainty: &[f64],
    mask: &[bool],
    convolved: &[f64],
    m: usize,
) -> Result<Array1<f64>, ()> {
    if m == 0 {
        return Ok(Array1::zeros(0));
    }
    let lambda_min = wavelength[0];
    let span = wavelength[wavelength.len() - 1] - lambda_min;

    let mut a = Array2::<f64>::zeros((m, m));
    let mut b = Array1::<f64>::zeros(m);
    for i in 0..wavelength.len() {
        if !mask[i] {
            continue;
        }
        let u = 2.0 * (wavelength[i] - lambda_min) / span - 1.0;
        let basis = legendre_basis(m, u);
        let inv_var = 1.0 / (uncertainty[i] * uncertainty[i]);
        let t = convolved[i];
        for j in 0..m {
            b[j] += flux[i] * t * basis[j] * inv_var;
            for k in 0..m {
                a[[j, k]] += t * t * basis[j] * basis[k] * inv_var;
            }
        }
    }

    let chol = cholesky_decompose(&a).ok_or(())?;
    let y = solve_lower(&chol, &b);
    Ok(solve_upper_transpose(&chol, &y))
}

fn evaluate_continuum(wavelength: &[f64], coefficients: &Array1<f64>) -> Vec<f64> {
    let m = coefficients.len();
    if m == 0 {
        return vec![1.0; wavelength.len()];
    }
    let lambda_min = wavelength[0];
    let span = wavelength[wavelength.len() - 1] - lambda_min;
    wavelength
        .iter()
        .map(|&x| {
            let u = 2.0 * (x - lambda_min) / span - 1.0;
            let basis = legendre_basis(m, u);
            basis.iter().zip(coefficients.iter()).map(|(&l, &c)| l * c).sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_section(n: usize, m: usize) -> Section {
        let wavelength: Vec<f64> = (0..n).map(|i| 5000.0 + i as f64).collect();
        let flux = vec![1.0; n];
        let uncertainty = vec![0.01; n];
        let mask = vec![true; n];
        Section::new("s".into(), wavelength, flux, uncertainty, mask, m, 0, Vec::new()).unwrap()
    }

    #[test]
    fn zero_sigma_zero_tau_conserves_flux() {
        let section = flat_section(40, 0);
        let values = vec![50.0]; // resolution slot only, no lines
        let eval = section.evaluate(&values);
        assert!(eval.cost.abs() < 1e-10);
        for &f in &eval.model_flux {
            assert!((f - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_non_monotonic_wavelengths() {
        let result = Section::new(
            "s".into(),
            vec![1.0, 1.0, 2.0],
            vec![1.0; 3],
            vec![0.1; 3],
            vec![true; 3],
            0,
            0,
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn legendre_matches_known_low_order_values() {
        let basis = legendre_basis(4, 0.5);
        assert!((basis[0] - 1.0).abs() < 1e-12);
        assert!((basis[1] - 0.5).abs() < 1e-12);
        assert!((basis[2] - (1.5 * 0.25 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn cholesky_round_trip_solves_simple_system() {
        let a = Array2::from_shape_vec((2, 2), vec![4.0, 2.0, 2.0, 3.0]).unwrap();
        let b = Array1::from_vec(vec![6.0, 5.0]);
        let l = cholesky_decompose(&a).unwrap();
        let y = solve_lower(&l, &b);
        let x = solve_upper_transpose(&l, &y);
        assert!((a.dot(&x) - &b).iter().all(|&d| d.abs() < 1e-9));
    }
}
