pub mod enums;
pub mod marker;
pub mod patient;

pub use marker::*;
pub use patient::*;
