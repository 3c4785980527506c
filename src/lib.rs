//! # catalyze - a small build tool for C projects
//!
//! A project is described by a `config.cat` file: one `config` block with
//! the compiler and global flags, then one `target` block per executable,
//! debug build, test binary or library.
//!
//! ```bash
//! catalyze new hello
//! cd hello
//! catalyze run
//! ```
//!
//! ## Module Organization
//!
//! - [`arena`] - Bump allocator that owns the config text and parsed model
//! - [`config`] - `config.cat` discovery, lexer and parser
//! - [`build`] - Compile waves, linking and progress reporting
//! - [`commands`] - CLI command handlers

/// Bump-pointer arena with vectorized fill and copy.
pub mod arena;

/// Core build system with bounded parallel compilation.
pub mod build;

/// CLI command handlers.
pub mod commands;

/// Configuration file parsing (`config.cat`).
pub mod config;

/// Terminal UI utilities (tables).
pub mod ui;
