pub mod enums;
pub mod medication;

pub use medication::*;
