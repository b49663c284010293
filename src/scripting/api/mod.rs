//! API modules for the `sylva` namespace
//!
//! Each submodule provides functions under `sylva::<module>::*`

pub mod config;
pub mod widgets;
