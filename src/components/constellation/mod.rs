mod backdrop;
mod camera;
mod component;
mod config;
mod host;
mod interaction;
mod loader;
mod render;
mod scene;
mod simulation;
mod state;
mod tether;
mod tween;
mod types;
mod universe;

pub use component::ConstellationCanvas;
