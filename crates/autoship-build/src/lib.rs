//! Dockerfile synthesis for autoship.
//!
//! # Synthesis
//!
//! ```text
//! autoship scan <path>
//!   1. Scan        ── autoship_core::scan → ProjectDescriptor
//!   2. Synthesize  ── DockerfileSynthesizer::synthesize (skipped if a Dockerfile exists)
//!   3. Build       ── autoship_deploy::ImageBuilder
//! ```
//!
//! Only Node.js projects have a template. Substitutions are plain line
//! replacements over the template text, driven by `package.json`
//! dependencies and the entry point source.

pub mod dockerfile;
pub mod manifest;

pub use dockerfile::{DockerfileSynthesizer, SynthesisError};
pub use manifest::PackageManifest;
