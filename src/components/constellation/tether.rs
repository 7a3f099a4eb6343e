use glam::Vec3;

use super::config::{TetherConfig, TetherLook};
use super::scene::MeshId;
use super::tween::{Easing, Tweened};
use super::types::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TetherState {
	Idle,
	Hovered,
	Dragged,
}

/// One end of a tether: the engine slot that drives it and the mesh it is
/// drawn against. Read-only from the tether's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TetherEnd {
	pub node: usize,
	pub mesh: MeshId,
}

/// Visual link between a sun and one of its planets.
pub struct Tether {
	pub planet_id: String,
	pub sun: TetherEnd,
	pub planet: TetherEnd,
	pub color: Rgb,
	state: TetherState,
	config: TetherConfig,
	brightness: Tweened,
	helix_speed: Tweened,
	helix_radius: Tweened,
	pulse: Tweened,
	time: f32,
	last_elapsed: Option<f32>,
	points: Vec<Vec3>,
}

impl Tether {
	pub fn new(
		planet_id: &str,
		sun: TetherEnd,
		planet: TetherEnd,
		color: Rgb,
		config: TetherConfig,
	) -> Self {
		Self {
			planet_id: planet_id.to_owned(),
			sun,
			planet,
			color,
			state: TetherState::Idle,
			brightness: Tweened::new(config.idle.brightness),
			helix_speed: Tweened::new(config.idle.helix_speed),
			helix_radius: Tweened::new(config.idle.helix_radius),
			pulse: Tweened::new(config.pulse_parked),
			time: 0.0,
			last_elapsed: None,
			points: vec![Vec3::ZERO; config.points.max(2)],
			config,
		}
	}

	pub fn state(&self) -> TetherState {
		self.state
	}

	pub fn brightness(&self) -> f32 {
		self.brightness.get()
	}

	pub fn helix_speed(&self) -> f32 {
		self.helix_speed.get()
	}

	pub fn helix_radius(&self) -> f32 {
		self.helix_radius.get()
	}

	/// Progress of the travelling pulse, 0 at the sun and 1 at the planet.
	/// Negative while no pulse has been launched.
	pub fn pulse_progress(&self) -> f32 {
		self.pulse.get()
	}

	pub fn time(&self) -> f32 {
		self.time
	}

	/// Evenly spaced points from the sun end to the planet end.
	pub fn points(&self) -> &[Vec3] {
		&self.points
	}

	fn ease_look(&mut self, look: TetherLook, duration: f32) {
		self.brightness
			.animate_to(look.brightness, duration, Easing::OutQuad);
		self.helix_speed
			.animate_to(look.helix_speed, duration, Easing::OutQuad);
	}

	pub fn hover_start(&mut self) {
		self.state = TetherState::Hovered;
		self.ease_look(self.config.hover, self.config.hover_duration);
		self.pulse.animate_from_to(
			0.0,
			1.0,
			self.config.pulse_duration,
			Easing::InOutCubic,
		);
	}

	pub fn hover_end(&mut self) {
		self.state = TetherState::Idle;
		self.ease_look(self.config.idle, self.config.hover_duration);
	}

	pub fn drag_start(&mut self) {
		self.state = TetherState::Dragged;
		let drag = self.config.drag;
		self.ease_look(drag, self.config.drag_duration);
		self.helix_radius
			.animate_to(drag.helix_radius, self.config.drag_duration, Easing::OutQuad);
	}

	pub fn drag_end(&mut self, still_hovered: bool) {
		if still_hovered {
			self.hover_start();
		} else {
			self.hover_end();
		}
		self.helix_radius.animate_to(
			self.config.idle.helix_radius,
			self.config.drag_duration,
			Easing::OutQuad,
		);
	}

	pub fn update(&mut self, elapsed: f32, sun: Vec3, planet: Vec3) {
		let dt = self.last_elapsed.map_or(0.0, |last| elapsed - last);
		self.last_elapsed = Some(elapsed);
		self.time = elapsed;

		for value in [
			&mut self.brightness,
			&mut self.helix_speed,
			&mut self.helix_radius,
			&mut self.pulse,
		] {
			value.advance(dt);
		}

		let last = self.points.len() - 1;
		for (index, point) in self.points.iter_mut().enumerate() {
			*point = sun.lerp(planet, index as f32 / last as f32);
		}
		self.points[0] = sun;
		self.points[last] = planet;
	}
}
