//! Perspective camera and the one-shot framer that fits it to the settled
//! constellation.

use glam::{Mat4, Vec2, Vec3};
use log::{debug, info};

use super::config::CameraConfig;
use super::scene::{Aabb, Ray};
use super::tween::{Easing, Tweened};

#[derive(Clone, Copy, Debug)]
struct Flight {
	from_position: Vec3,
	to_position: Vec3,
	from_target: Vec3,
	to_target: Vec3,
	progress: Tweened,
}

#[derive(Clone, Debug)]
pub struct Camera {
	pub position: Vec3,
	pub target: Vec3,
	pub fov_deg: f32,
	pub aspect: f32,
	pub near: f32,
	pub far: f32,
	min_distance: f32,
	max_distance: f32,
	flight: Option<Flight>,
}

impl Camera {
	pub fn new(config: &CameraConfig, aspect: f32) -> Self {
		Self {
			position: Vec3::new(0.0, 0.0, config.start_distance),
			target: Vec3::ZERO,
			fov_deg: config.fov_deg,
			aspect: sanitize_aspect(aspect),
			near: config.near,
			far: config.far,
			min_distance: 0.0,
			max_distance: f32::INFINITY,
			flight: None,
		}
	}

	pub fn forward(&self) -> Vec3 {
		(self.target - self.position)
			.try_normalize()
			.unwrap_or(Vec3::NEG_Z)
	}

	pub fn distance(&self) -> f32 {
		self.position.distance(self.target)
	}

	#[cfg(test)]
	pub fn distance_limits(&self) -> (f32, f32) {
		(self.min_distance, self.max_distance)
	}

	pub fn set_distance_limits(&mut self, min: f32, max: f32) {
		self.min_distance = min.max(0.0);
		self.max_distance = max.max(self.min_distance);
	}

	pub fn view(&self) -> Mat4 {
		Mat4::look_at_rh(self.position, self.target, Vec3::Y)
	}

	pub fn projection(&self) -> Mat4 {
		Mat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
	}

	pub fn view_projection(&self) -> Mat4 {
		self.projection() * self.view()
	}

	/// Ray from the eye through a point in normalized device coordinates.
	pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
		let unprojected = self
			.view_projection()
			.inverse()
			.project_point3(ndc.extend(0.5));
		Ray::new(self.position, unprojected - self.position)
	}

	/// World point to NDC, with z as NDC depth. `None` behind the eye.
	pub fn project(&self, point: Vec3) -> Option<Vec3> {
		let clip = self.view_projection() * point.extend(1.0);
		(clip.w > self.near).then(|| clip.truncate() / clip.w)
	}

	/// Distance in front of the eye along the view axis.
	pub fn depth(&self, point: Vec3) -> f32 {
		(point - self.position).dot(self.forward())
	}

	/// How many screen pixels one world unit spans at `point`.
	pub fn pixels_per_unit(&self, point: Vec3, viewport_height: f32) -> Option<f32> {
		let depth = self.depth(point);
		if depth <= self.near {
			return None;
		}
		let focal = viewport_height * 0.5 / (self.fov_deg.to_radians() * 0.5).tan();
		Some(focal / depth)
	}

	/// Moves eye and target together.
	pub fn translate(&mut self, delta: Vec3) {
		self.position += delta;
		self.target += delta;
	}

	/// Scales the eye's distance from the target, within the distance limits.
	pub fn dolly(&mut self, factor: f32) {
		let offset = self.position - self.target;
		let Some(direction) = offset.try_normalize() else {
			return;
		};
		let distance = (offset.length() * factor).clamp(self.min_distance, self.max_distance);
		self.position = self.target + direction * distance;
	}

	pub fn resize(&mut self, aspect: f32) {
		self.aspect = sanitize_aspect(aspect);
	}

	pub fn fly_to(&mut self, position: Vec3, target: Vec3, duration: f32, easing: Easing) {
		let mut progress = Tweened::new(0.0);
		progress.animate_to(1.0, duration, easing);
		self.flight = Some(Flight {
			from_position: self.position,
			to_position: position,
			from_target: self.target,
			to_target: target,
			progress,
		});
		self.update(0.0);
	}

	#[cfg(test)]
	pub fn is_flying(&self) -> bool {
		self.flight.is_some()
	}

	/// Stops a flight where it is. Used when the user grabs the view.
	pub fn cancel_flight(&mut self) {
		if self.flight.take().is_some() {
			debug!("camera flight interrupted");
		}
	}

	pub fn update(&mut self, dt: f32) {
		let Some(flight) = self.flight.as_mut() else {
			return;
		};
		flight.progress.advance(dt);
		let t = flight.progress.get();
		self.position = flight.from_position.lerp(flight.to_position, t);
		self.target = flight.from_target.lerp(flight.to_target, t);
		if !flight.progress.is_animating() {
			self.position = flight.to_position;
			self.target = flight.to_target;
			self.flight = None;
		}
	}
}

fn sanitize_aspect(aspect: f32) -> f32 {
	if aspect.is_finite() && aspect > 0.0 {
		aspect
	} else {
		1.0
	}
}

/// Eye distance that fits `bounds` in view, padded.
pub fn framing_distance(bounds: &Aabb, config: &CameraConfig) -> f32 {
	let size = bounds.size();
	let max_dim = size.x.max(size.y).max(config.frame_min_extent);
	let half_fov = (config.fov_deg.to_radians() * 0.5).tan();
	max_dim * 0.5 / half_fov * config.frame_padding
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum FramerState {
	#[default]
	Idle,
	Armed,
	Done,
}

/// Moves the camera once, the first time the layout settles.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraFramer {
	state: FramerState,
}

impl CameraFramer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn arm(&mut self) {
		if self.state == FramerState::Idle {
			self.state = FramerState::Armed;
		}
	}

	#[cfg(test)]
	pub fn is_armed(&self) -> bool {
		self.state == FramerState::Armed
	}

	#[cfg(test)]
	pub fn is_done(&self) -> bool {
		self.state == FramerState::Done
	}

	/// Returns `true` if this call started the framing flight. Any later call
	/// is ignored, and an empty bounding volume spends the trigger.
	pub fn notify_settled(
		&mut self,
		camera: &mut Camera,
		bounds: Option<Aabb>,
		config: &CameraConfig,
	) -> bool {
		if self.state != FramerState::Armed {
			return false;
		}
		self.state = FramerState::Done;

		let Some(bounds) = bounds else {
			debug!("nothing to frame");
			return false;
		};
		let center = bounds.center();
		let distance = framing_distance(&bounds, config);
		info!("framing constellation at distance {distance:.1}");

		camera.fly_to(
			Vec3::new(center.x, center.y, distance),
			center,
			config.frame_duration,
			Easing::InOutQuart,
		);
		camera.set_distance_limits(distance / 5.0, distance * 1.5);
		true
	}
}
