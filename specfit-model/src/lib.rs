//! Parametric absorption-line spectral model: parses a model definition,
//! resolves it into a flat optimisation vector, fits it by CMA-ES against
//! observed spectra, and renders the result as an HTML document.

pub mod cli;
pub mod error;
pub mod html;
pub mod model_io;
pub mod parameter_space;
pub mod section;

pub use error::{ExitCode, ModelError, ModelResult};
pub use parameter_space::{ParameterSpace, Slot};
pub use section::{ProfileKind, Section};

use std::io::Read;
use std::path::Path;

use clap::Parser;
use specfit_cmaes::{CallbackAction, CmaEs, CmaEsConfig};

use crate::cli::Args;
use crate::html::{render, ResultDocument, TraceRow};

/// Outcome of a full fit: the resolved parameter space (with values and
/// uncertainties written back in), the rendered result document, and the
/// exit code the driver binary should report.
pub struct FitOutcome {
    pub space: ParameterSpace,
    pub document: String,
    pub exit_code: ExitCode,
}

/// Parse a model, run the optimiser, and render the result. `model_text`
/// is the full contents of the model file; `base_dir` is the directory
/// data files are resolved relative to.
pub fn fit(args: &Args, command_line: &str, model_text: &str, profile_kind: ProfileKind, base_dir: Option<&Path>) -> ModelResult<FitOutcome> {
    let definition = model_io::parse_model(model_text, args.comment_mark, profile_kind.arity())?;
    let mut space = ParameterSpace::build(definition, profile_kind, base_dir)?;

    let n = space.parameter_count();
    if n == 0 {
        let cost = space.cost(&[]);
        space.apply(&[], &[]);
        log::info!("model has no free parameters; reporting fixed cost {cost}");
        let document = render(
            &ResultDocument { command: command_line.to_string(), model_text, trace: &[], message: format!("fixed model, cost = {cost}") },
            &space,
        );
        return Ok(FitOutcome { space, document, exit_code: ExitCode::Completed });
    }

    let (lower, upper) = space.constraint();
    let config = CmaEsConfig::builder(n)
        .parent_number(args.parents)
        .population_size(args.effective_population())
        .initial_step_size(args.step)
        .initial_local_step_sizes(space.initial_step_sizes())
        .accuracy_goal(args.accuracy)
        .stop_generation(args.stop)
        .random_seed(args.seed)
        .bounds(lower, upper)
        .build()
        .map_err(|e| ModelError::InvalidArgument(e.to_string()))?;

    let optimizer = CmaEs::new(config);
    let initial_mean = ndarray::Array1::from(space.initial_values());

    let mut trace = Vec::new();
    let trace_modulus = args.trace;
    let report = optimizer.minimize(
        |x| space.cost(x.as_slice().expect("contiguous candidate vector")),
        initial_mean,
        |intermediate| {
            if trace_modulus > 0 && intermediate.generation % trace_modulus == 0 {
                trace.push(TraceRow {
                    generation: intermediate.generation,
                    cost: intermediate.best_cost,
                    min_step: intermediate.sigma_min_spread,
                    max_step: intermediate.sigma_max_spread,
                });
            }
            CallbackAction::Continue
        },
    )?;

    space.apply(
        report.best_parameters.as_slice().expect("contiguous result vector"),
        report.uncertainties.as_slice().expect("contiguous uncertainty vector"),
    );

    let (message, exit_code) = if report.underflow {
        ("mutation variance underflow".to_string(), ExitCode::Underflow)
    } else if report.converged {
        (format!("optimisation completed after {} generations, cost = {}", report.generations, report.best_cost), ExitCode::Completed)
    } else {
        (format!("stopped without convergence after {} generations", report.generations), ExitCode::Stopped)
    };
    log::info!("{message}");

    let document = render(&ResultDocument { command: command_line.to_string(), model_text, trace: &trace, message }, &space);
    Ok(FitOutcome { space, document, exit_code })
}

/// Read the model definition from a reader (typically stdin).
pub fn read_model(mut reader: impl Read) -> ModelResult<String> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}

/// Shared body of every profile-flavour CLI binary: parse arguments, read
/// the model from stdin, fit it, print the result document to stdout, and
/// return the process exit code. `profile_kind` is the one fixed choice
/// that distinguishes the flavour front-ends from one another.
pub fn run_cli(profile_kind: ProfileKind) -> ExitCode {
    let args = Args::parse();
    if let Err(message) = args.validate() {
        eprintln!("specfit: {message}");
        return ExitCode::LogicError;
    }

    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    match run(&args, &command_line, profile_kind) {
        Ok(exit_code) => exit_code,
        Err(err) => {
            eprintln!("specfit: {err}");
            ExitCode::from(&err)
        }
    }
}

fn run(args: &Args, command_line: &str, profile_kind: ProfileKind) -> ModelResult<ExitCode> {
    let model_text = read_model(std::io::stdin())?;
    let outcome = fit(args, command_line, &model_text, profile_kind, Some(Path::new(".")))?;
    println!("{}", outcome.document);
    Ok(outcome.exit_code)
}
