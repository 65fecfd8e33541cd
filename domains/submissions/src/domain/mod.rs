//! Domain layer for Submissions

pub mod entities;
pub mod state;
