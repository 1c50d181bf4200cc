//! Emotion-based playlist library - shared modules for the CLI and hosts.

pub mod catalog;
pub mod classify;
pub mod engine;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod recommend;
pub mod scoring;
pub mod tables;
