//! Voigt profile front-end, for lines with a non-negligible damping
//! constant. Same I/O contract as the Doppler front-end; see `specfit.rs`.

use specfit_model::ProfileKind;

fn main() {
    env_logger::init();
    std::process::exit(specfit_model::run_cli(ProfileKind::Voigt).code());
}
