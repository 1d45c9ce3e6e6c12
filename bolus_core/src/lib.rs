#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Insulin bolus calculation core.
//!
//! This crate turns a meal's carbohydrate grams, an optional glucose reading
//! and the user's medical profile into a recommended bolus. It performs no
//! I/O: profiles arrive through `bolus_traits::ProfileStore`.
//!
//! ## Architecture
//!
//! - **Ratio notation**: "1:N" text to units per gram and back (`ratio` module)
//! - **Resolution**: profile fields validated, adjustment defaults applied (`profile` module)
//! - **Calculation**: simple and adjusted strategies (`calculator` module)
//! - **Advisories**: glucose and dose safety thresholds (`warning` module)
//! - **Service**: profile lookup plus mode selection (`service` module)
//!
//! ## Units
//!
//! Ratios are always units of insulin per gram of carbohydrate, glucose is
//! mg/dL, doses are insulin units in `f32`. Rounded doses are exact multiples
//! of 0.5 (see `rounding`).

pub mod calculator;
pub mod config;
pub mod conversions;
pub mod error;
pub mod mocks;
pub mod profile;
pub mod ratio;
pub mod rounding;
pub mod scan_cache;
pub mod service;
pub mod store;
pub mod warning;

pub use bolus_traits::{MedicalProfile, ProfileStore, UserId};
pub use calculator::{ActivityLevel, CalculationMode, DoseBreakdown, DoseCalculator, DoseRequest};
pub use config::{AdjustmentPercents, CalculatorCfg, FallbackParams, WarningThresholds};
pub use error::{DoseError, Result};
pub use profile::{CompleteParams, ProfileField, ResolvedParams, resolve};
pub use scan_cache::{ScanCache, content_hash};
pub use service::BolusService;
pub use store::InMemoryProfileStore;
pub use warning::{Advisory, warning_for};
