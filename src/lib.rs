//! Wet-paint watercolor simulation: a 16-channel fixed-point pixel
//! format, a paper texture generator, an absorption-model compositor, a
//! water/pigment diffusion engine and a wet brush — everything needed to
//! push watercolor around a canvas, none of the GUI.
//!
//! The crate also ships as a headless binary that paints strokes, runs
//! the simulation and writes a PNG; see `cli`.

pub mod canvas;
pub mod cli;
pub mod logger;
pub mod ops;
pub mod palette;
pub mod render;
pub mod texture;
pub mod wetpix;
