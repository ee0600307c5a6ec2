//! Doppler-profile front-end: reads a model definition from stdin, fits it
//! by CMA-ES, and writes the result HTML document to stdout.
//!
//! `<prog> seed parents population step accuracy stop trace < model.txt [> result.html]`

use specfit_model::ProfileKind;

fn main() {
    env_logger::init();
    std::process::exit(specfit_model::run_cli(ProfileKind::Doppler).code());
}
