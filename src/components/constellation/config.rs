//! Tunables for the constellation engine.
//!
//! Every struct deserializes with `#[serde(default)]`, so a `settings` object in
//! `projects.json` only needs to name the values it overrides.

use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConstellationConfig {
	pub simulation: SimulationConfig,
	pub tether: TetherConfig,
	pub camera: CameraConfig,
	pub galaxy: GalaxyConfig,
}

/// Force layout parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Spring strength shared by every link.
	pub link_strength: f32,
	/// Rest length of a link.
	pub link_distance: f32,
	/// Many-body strength of a sun (negative repels).
	pub sun_charge: f32,
	/// Many-body strength of a planet (negative repels).
	pub planet_charge: f32,
	/// Pull toward the world origin.
	pub center_strength: f32,
	/// Pull toward the z = 0 plane.
	pub plane_strength: f32,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f32,
	/// Alpha below which the simulation stops ticking.
	pub alpha_min: f32,
	/// Alpha below which the layout counts as settled.
	pub settle_threshold: f32,
	/// Alpha target while a node is being dragged.
	pub drag_alpha_target: f32,
	/// Squared distance floor for the many-body force.
	pub distance_min_sq: f32,
}

impl SimulationConfig {
	/// Geometric decay that takes alpha from 1 to `alpha_min` in 300 ticks.
	pub fn alpha_decay(&self) -> f32 {
		1.0 - self.alpha_min.max(f32::EPSILON).powf(1.0 / 300.0)
	}
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			link_strength: 1.5,
			link_distance: 30.0,
			sun_charge: -500.0,
			planet_charge: -20.0,
			center_strength: 0.02,
			plane_strength: 1.0,
			velocity_decay: 0.4,
			alpha_min: 0.001,
			settle_threshold: 0.1,
			drag_alpha_target: 0.3,
			distance_min_sq: 1.0,
		}
	}
}

/// Visual parameter set a tether eases toward.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct TetherLook {
	pub brightness: f32,
	pub helix_speed: f32,
	pub helix_radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
	pub points: usize,
	pub idle: TetherLook,
	pub hover: TetherLook,
	pub drag: TetherLook,
	pub hover_duration: f32,
	pub drag_duration: f32,
	pub pulse_duration: f32,
	/// Pulse progress while no pulse is travelling.
	pub pulse_parked: f32,
}

impl Default for TetherConfig {
	fn default() -> Self {
		Self {
			points: 200,
			idle: TetherLook {
				brightness: 0.25,
				helix_speed: 0.5,
				helix_radius: 0.2,
			},
			hover: TetherLook {
				brightness: 0.7,
				helix_speed: 1.0,
				helix_radius: 0.2,
			},
			drag: TetherLook {
				brightness: 1.0,
				helix_speed: 1.5,
				helix_radius: 0.8,
			},
			hover_duration: 0.3,
			drag_duration: 0.5,
			pulse_duration: 1.0,
			pulse_parked: -2.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
	pub fov_deg: f32,
	pub near: f32,
	pub far: f32,
	pub start_distance: f32,
	/// Multiplier applied to the fitted distance when framing.
	pub frame_padding: f32,
	/// Smallest planar extent the framer will fit.
	pub frame_min_extent: f32,
	pub frame_duration: f32,
}

impl Default for CameraConfig {
	fn default() -> Self {
		Self {
			fov_deg: 55.0,
			near: 0.1,
			far: 1000.0,
			start_distance: 100.0,
			frame_padding: 1.2,
			frame_min_extent: 50.0,
			frame_duration: 1.5,
		}
	}
}

/// A shell of background stars at a fixed distance.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct StarLayer {
	pub count: usize,
	pub size: f32,
	pub color: [f32; 3],
	pub distance: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
	pub count: usize,
	pub radius: f32,
	pub branches: u32,
	pub spin: f32,
	pub randomness: f32,
	pub randomness_power: i32,
	pub inside_color: [f32; 3],
	pub outside_color: [f32; 3],
	pub rotation_speed: f32,
	pub portal_radius: f32,
	pub wave_duration: f32,
	pub star_layers: Vec<StarLayer>,
	/// Minimum seconds between shooting stars.
	pub shot_interval: f32,
	/// Probability threshold a roll must exceed to spawn a shooting star.
	pub shot_chance: f32,
	pub shot_distance: f32,
	pub shot_speed: f32,
	pub shot_life: f32,
}

impl Default for GalaxyConfig {
	fn default() -> Self {
		Self {
			count: 6000,
			radius: 18.0,
			branches: 3,
			spin: 0.3,
			randomness: 0.5,
			randomness_power: 3,
			inside_color: [0.867, 0.867, 0.867],
			outside_color: [0.067, 0.067, 0.067],
			rotation_speed: 0.1,
			portal_radius: 2.0,
			wave_duration: 1.5,
			star_layers: vec![
				StarLayer {
					count: 2000,
					size: 0.3,
					color: [1.0, 1.0, 1.0],
					distance: 200.0,
				},
				StarLayer {
					count: 1000,
					size: 0.4,
					color: [0.867, 0.867, 1.0],
					distance: 150.0,
				},
				StarLayer {
					count: 500,
					size: 0.5,
					color: [1.0, 1.0, 0.867],
					distance: 100.0,
				},
			],
			shot_interval: 2.0,
			shot_chance: 0.7,
			shot_distance: 50.0,
			shot_speed: 50.0,
			shot_life: 3.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn alpha_decay_reaches_alpha_min_in_300_ticks() {
		let config = SimulationConfig::default();
		let alpha = (1.0 - config.alpha_decay()).powi(300);
		assert!((alpha - config.alpha_min).abs() < 1e-4);
	}

	#[test]
	fn partial_settings_keep_defaults() {
		let config: ConstellationConfig =
			serde_json::from_str(r#"{"simulation":{"link_strength":2.0}}"#).unwrap();
		assert_eq!(config.simulation.link_strength, 2.0);
		assert_eq!(config.simulation.sun_charge, -500.0);
		assert_eq!(config.tether.points, 200);
	}
}
