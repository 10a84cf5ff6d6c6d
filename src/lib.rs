//! Mosaico — multi-panel photo collage editor.
//!
//! The engine modules (`collage`, `ops`, `interact`, `render`) are pure and
//! UI-free: they take surface sizes, decoded bitmaps and timestamps as plain
//! values so the whole interaction/rendering core can be exercised from
//! tests and from the headless CLI. The egui host lives in `app` and
//! `components`.

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod logger;

pub mod collage;
pub mod interact;
pub mod ops;
pub mod render;
pub mod templates;

pub mod io;
pub mod project;

pub mod app;
pub mod cli;
pub mod components;
