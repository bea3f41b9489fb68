//! Entities, attribute maps and lookup keys.

pub mod entity;
pub mod lookup;

pub use entity::*;
pub use lookup::*;
