//! Integration layer for the Atmospheric Dispersion Corrector control core.
//!
//! Ties together the bus driver facade (`adc-bus`), the per-motor engine
//! (`adc-motor`), and the homing/reference manager (`adc-homing`) behind one
//! long-lived [`Controller`] value, the single owner of all session state.
//!
//! This crate owns:
//! - configuration file loading (§6, [`config`]),
//! - the ZA→ADC lookup table and its interpolators (§4.4.1, [`lookup`]),
//! - the dual-motor orchestrator's ZA→counts pipeline and parallel
//!   per-motor dispatch with error isolation (§4.4, [`orchestrator`]),
//! - the aggregate [`ControllerError`](error::ControllerError) type, and
//! - the tagged [`action::ActionResponse`] returned across the public
//!   action surface (§6, §9).

pub mod action;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod orchestrator;

pub use action::ActionResponse;
pub use config::AdcConfig;
pub use controller::{Controller, MotorStatus};
pub use error::ControllerError;
pub use lookup::{InterpolationMethod, LookupTable};
