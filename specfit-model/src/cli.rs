//! Shared command-line surface for every profile-variant front-end
//! (Doppler, many-multiplet, Voigt): positional arguments matching the
//! historical `<prog> seed parents population step accuracy stop trace`
//! invocation, reading the model from stdin and writing the result HTML
//! to stdout.

use clap::Parser;

/// `<prog> <seed> <parents> <population> <step> <accuracy> <stop> <trace> < model.txt [> result.html]`
#[derive(Parser, Debug, Clone)]
#[command(author, about = "Fit a parametric absorption-line model by CMA-ES", long_about = None)]
pub struct Args {
    /// Seed for the optimiser's random number generator.
    pub seed: u64,

    /// Parent number (mu); population defaults to 2*mu.
    pub parents: usize,

    /// Population size (lambda). Pass 0 to use the default, 2*parents.
    pub population: usize,

    /// Initial global step size (sigma).
    pub step: f64,

    /// Relative per-axis accuracy goal.
    pub accuracy: f64,

    /// Generation budget.
    pub stop: usize,

    /// Trace every `trace` generations to the result log; 0 disables tracing.
    pub trace: usize,

    /// Comment marker for the model file (default '%').
    #[arg(long, default_value_t = '%')]
    pub comment_mark: char,
}

impl Args {
    pub fn validate(&self) -> Result<(), String> {
        if self.parents == 0 {
            return Err("parents must be > 0".to_string());
        }
        if self.population != 0 && self.population < self.parents {
            return Err(format!("population ({}) must be >= parents ({})", self.population, self.parents));
        }
        if self.step <= 0.0 {
            return Err("step must be > 0".to_string());
        }
        if self.accuracy <= 0.0 {
            return Err("accuracy must be > 0".to_string());
        }
        Ok(())
    }

    pub fn effective_population(&self) -> usize {
        if self.population == 0 {
            2 * self.parents
        } else {
            self.population
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_double_parents_when_population_is_zero() {
        let args = Args::parse_from(["specfit", "1", "4", "0", "1.0", "1e-4", "1000", "0"]);
        assert_eq!(args.effective_population(), 8);
    }

    #[test]
    fn rejects_zero_parents() {
        let args = Args::parse_from(["specfit", "1", "0", "0", "1.0", "1e-4", "1000", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn rejects_population_smaller_than_parents() {
        let args = Args::parse_from(["specfit", "1", "8", "4", "1.0", "1e-4", "1000", "0"]);
        assert!(args.validate().is_err());
    }
}
