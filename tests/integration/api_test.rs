//! API endpoint integration tests
//!
//! Drives the composed router over the in-memory store and mock adapters:
//! intake, moderation, task delivery, sweep and prompt assistance.

#![allow(dead_code)]

mod common;
mod generation;
mod moderation;
mod prompts;
mod submissions;
