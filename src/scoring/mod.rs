pub mod aggregate;
pub mod biological_age;
pub mod classify;
pub mod engine;
pub mod helpers;
pub mod patterns;
pub mod reference;
pub mod types;
pub mod validation;

pub use engine::DefaultRiskEngine;
pub use reference::ScoringReferenceData;
pub use types::*;
