//! Domain layer containing session entities.

pub mod entities;
