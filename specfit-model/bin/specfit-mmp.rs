//! Many-multiplet profile front-end, for fitting a putative variation of
//! the fine-structure constant from relative line positions. Same I/O
//! contract as the Doppler front-end; see `specfit.rs`.

use specfit_model::ProfileKind;

fn main() {
    env_logger::init();
    std::process::exit(specfit_model::run_cli(ProfileKind::ManyMultiplet).code());
}
