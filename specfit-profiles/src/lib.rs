//! Absorption-line profile functions.
//!
//! Provides the closed-form optical-depth shapes used by the section
//! evaluator: Doppler, many-multiplet, and Voigt-type lines, combined into
//! a [`Superposition`], plus equivalent-width integration and the shared
//! pseudo-Voigt kernels that back the Voigt variant.

pub mod constants;
mod kernels;
pub mod equivalent_width;
pub mod profile;
pub mod superposition;
pub mod voigt;

pub use equivalent_width::equivalent_width;
pub use kernels::truncate;
pub use profile::{DopplerParams, ManyMultipletParams, Profile, VoigtParams};
pub use superposition::Superposition;
pub use voigt::{ExtendedPseudoVoigt, PseudoVoigt};
