//! Submission workflows that sit between the HTTP handlers and the adapters

pub mod generation;
pub mod moderation;
pub mod prompts;
pub mod sweep;
