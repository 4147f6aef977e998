// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node catalog.

pub mod helpers;
pub mod shader;

pub use shader::create_shader_registry;
