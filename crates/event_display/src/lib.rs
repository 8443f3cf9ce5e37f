//! Event display front-end.
//!
//! Renders a Cherenkov detector event built with [`cylmesh`] either to a PNG
//! (plotters bitmap backend) or into an interactive winit/wgpu/egui window.

pub mod camera;
pub mod config;
pub mod plot;
pub mod viewer;
