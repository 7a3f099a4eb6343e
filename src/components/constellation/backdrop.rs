//! Galaxy backdrop: spiral galaxy points, starfield shells, shooting stars and
//! the portal at the centre.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec3};
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::{GalaxyConfig, StarLayer};
use super::scene::{Layer, MeshId, MeshKind, PickOwner, Scene, U_TIME, U_WAVE_STRENGTH};
use super::tween::{Easing, Tweened};
use super::types::Rgb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GalaxyPoint {
	/// Position in the galaxy's own frame, before tilt and spin.
	pub position: Vec3,
	pub color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
	pub position: Vec3,
	pub size: f32,
	pub color: Rgb,
	pub shimmer: f32,
}

impl Star {
	/// Brightness factor in `0.0..=1.0`.
	pub fn twinkle(&self, time: f32) -> f32 {
		(self.shimmer + time * 0.5).sin() * 0.5 + 0.5
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootingStar {
	pub position: Vec3,
	pub direction: Vec3,
	pub life: f32,
}

pub struct Backdrop {
	config: GalaxyConfig,
	galaxy: Vec<GalaxyPoint>,
	stars: Vec<Star>,
	shooting: Vec<ShootingStar>,
	last_shot: f32,
	time: f32,
	wave: Tweened,
	portal: MeshId,
	rng: SmallRng,
}

impl Backdrop {
	pub fn new(config: GalaxyConfig, scene: &mut Scene, seed: u64) -> Self {
		let mut rng = SmallRng::seed_from_u64(seed);
		let galaxy = generate_galaxy(&config, &mut rng);
		let stars = config
			.star_layers
			.iter()
			.flat_map(|layer| generate_layer(layer, &mut rng))
			.collect::<Vec<_>>();
		let portal = scene.spawn(
			MeshKind::Portal,
			Layer::Portal,
			Vec3::ZERO,
			config.portal_radius,
			[0.0; 3],
			PickOwner::Portal,
		);
		debug!(
			"backdrop generated: {} galaxy points, {} stars",
			galaxy.len(),
			stars.len()
		);

		Self {
			config,
			galaxy,
			stars,
			shooting: Vec::new(),
			last_shot: 0.0,
			time: 0.0,
			wave: Tweened::new(0.0),
			portal,
			rng,
		}
	}

	pub fn galaxy(&self) -> &[GalaxyPoint] {
		&self.galaxy
	}

	pub fn stars(&self) -> &[Star] {
		&self.stars
	}

	pub fn shooting_stars(&self) -> &[ShootingStar] {
		&self.shooting
	}

	pub fn portal(&self) -> MeshId {
		self.portal
	}

	pub fn time(&self) -> f32 {
		self.time
	}

	pub fn wave_strength(&self) -> f32 {
		self.wave.get()
	}

	/// Eases the galaxy ripple in or out.
	pub fn set_portal_hovered(&mut self, hovered: bool) {
		let target = if hovered { 1.0 } else { 0.0 };
		if self.wave.target() != target {
			self.wave
				.animate_to(target, self.config.wave_duration, Easing::OutCubic);
		}
	}

	/// Galaxy frame to world: tilted flat, spinning slowly about its axis.
	pub fn galaxy_matrix(&self) -> Mat4 {
		Mat4::from_rotation_x(-FRAC_PI_2)
			* Mat4::from_rotation_y(self.time * self.config.rotation_speed * 0.1)
	}

	/// Vertical ripple applied to a galaxy point while the portal is hovered.
	pub fn wave_offset(&self, point: &GalaxyPoint) -> f32 {
		let strength = self.wave.get();
		if strength <= 0.0 {
			return 0.0;
		}
		let distance = point.position.x.hypot(point.position.z);
		(distance * 0.8 - self.time * 3.0).sin() * strength * 0.6
	}

	pub fn update(&mut self, scene: &mut Scene, elapsed: f32, dt: f32) {
		self.time = elapsed;
		self.wave.advance(dt);
		if let Some(mesh) = scene.mesh_mut(self.portal) {
			mesh.uniforms.set(U_TIME, elapsed);
			mesh.uniforms.set(U_WAVE_STRENGTH, self.wave.get());
		}

		if elapsed - self.last_shot > self.config.shot_interval
			&& self.rng.r#gen::<f32>() > self.config.shot_chance
		{
			self.launch_shooting_star();
			self.last_shot = elapsed;
		}

		let speed = self.config.shot_speed;
		for star in &mut self.shooting {
			star.position += star.direction * dt * speed;
			star.life -= dt;
		}
		self.shooting.retain(|star| star.life > 0.0);
	}

	fn launch_shooting_star(&mut self) {
		let position = random_on_sphere(&mut self.rng, self.config.shot_distance);
		let direction = (-position).try_normalize().unwrap_or(Vec3::NEG_Z);
		self.shooting.push(ShootingStar {
			position,
			direction,
			life: self.config.shot_life,
		});
	}
}

fn signed_offset(rng: &mut SmallRng, config: &GalaxyConfig, radius: f32) -> f32 {
	let sign = if rng.r#gen::<f32>() < 0.5 { 1.0 } else { -1.0 };
	rng.r#gen::<f32>().powi(config.randomness_power) * sign * config.randomness * radius
}

fn generate_galaxy(config: &GalaxyConfig, rng: &mut SmallRng) -> Vec<GalaxyPoint> {
	let branches = config.branches.max(1);
	let inside = Vec3::from(config.inside_color);
	let outside = Vec3::from(config.outside_color);

	(0..config.count)
		.map(|index| {
			let radius = rng.r#gen::<f32>() * config.radius;
			let spin = radius * config.spin;
			let branch = (index as u32 % branches) as f32 / branches as f32 * TAU;
			let offset = Vec3::new(
				signed_offset(rng, config, radius),
				signed_offset(rng, config, radius),
				signed_offset(rng, config, radius),
			);
			let position = Vec3::new(
				(branch + spin).cos() * radius,
				0.0,
				(branch + spin).sin() * radius,
			) + offset;
			let mix = if config.radius > 0.0 {
				radius / config.radius
			} else {
				0.0
			};
			GalaxyPoint {
				position,
				color: inside.lerp(outside, mix).to_array(),
			}
		})
		.collect()
}

fn random_on_sphere(rng: &mut SmallRng, distance: f32) -> Vec3 {
	let theta = TAU * rng.r#gen::<f32>();
	let phi = (2.0 * rng.r#gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
	Vec3::new(
		distance * phi.sin() * theta.cos(),
		distance * phi.sin() * theta.sin(),
		distance * phi.cos(),
	)
}

fn generate_layer(layer: &StarLayer, rng: &mut SmallRng) -> Vec<Star> {
	(0..layer.count)
		.map(|_| Star {
			position: random_on_sphere(rng, layer.distance),
			size: layer.size,
			color: layer.color,
			shimmer: rng.r#gen::<f32>() * 10.0,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn small_config() -> GalaxyConfig {
		GalaxyConfig {
			count: 300,
			star_layers: vec![StarLayer {
				count: 50,
				size: 0.3,
				color: [1.0; 3],
				distance: 200.0,
			}],
			..GalaxyConfig::default()
		}
	}

	#[test]
	fn generation_is_deterministic_per_seed() {
		let mut scene = Scene::new();
		let a = Backdrop::new(small_config(), &mut scene, 9);
		let b = Backdrop::new(small_config(), &mut scene, 9);
		let c = Backdrop::new(small_config(), &mut scene, 10);
		assert_eq!(a.galaxy(), b.galaxy());
		assert_eq!(a.stars(), b.stars());
		assert_ne!(a.galaxy(), c.galaxy());
	}

	#[test]
	fn galaxy_and_stars_respect_their_shapes() {
		let config = small_config();
		let mut scene = Scene::new();
		let backdrop = Backdrop::new(config.clone(), &mut scene, 1);
		assert_eq!(backdrop.galaxy().len(), 300);
		let limit = config.radius * (1.0 + config.randomness * 3.0_f32.sqrt());
		for point in backdrop.galaxy() {
			assert!(point.position.length() <= limit + 1e-3);
		}
		for star in backdrop.stars() {
			assert!((star.position.length() - 200.0).abs() < 1e-2);
			let twinkle = star.twinkle(12.3);
			assert!((0.0..=1.0).contains(&twinkle));
		}
	}

	#[test]
	fn portal_sits_on_its_own_layer() {
		let mut scene = Scene::new();
		let backdrop = Backdrop::new(small_config(), &mut scene, 1);
		let portal = scene.mesh(backdrop.portal()).unwrap();
		assert_eq!(portal.layer, Layer::Portal);
		assert_eq!(portal.radius, 2.0);
		assert_eq!(scene.owner(backdrop.portal()), Some(&PickOwner::Portal));
	}

	#[test]
	fn shooting_stars_spawn_and_expire() {
		let mut scene = Scene::new();
		let mut backdrop = Backdrop::new(small_config(), &mut scene, 4);
		let dt = 0.1;
		let mut seen = 0;
		for frame in 1..=1200 {
			let before = backdrop.shooting_stars().len();
			backdrop.update(&mut scene, frame as f32 * dt, dt);
			if backdrop.shooting_stars().len() > before {
				seen += 1;
			}
			// Life outlasts the interval by at most one spawn.
			assert!(backdrop.shooting_stars().len() <= 2);
			for star in backdrop.shooting_stars() {
				assert!(star.life > 0.0);
				assert!((star.direction.length() - 1.0).abs() < 1e-4);
			}
		}
		assert!(seen > 0);
	}

	#[test]
	fn portal_hover_eases_wave() {
		let mut scene = Scene::new();
		let mut backdrop = Backdrop::new(small_config(), &mut scene, 2);
		backdrop.set_portal_hovered(true);
		backdrop.update(&mut scene, 0.5, 0.5);
		let halfway = backdrop.wave_strength();
		assert!(halfway > 0.0 && halfway < 1.0);
		backdrop.update(&mut scene, 2.0, 1.5);
		assert_eq!(backdrop.wave_strength(), 1.0);
		let portal = scene.mesh(backdrop.portal()).unwrap();
		assert_eq!(portal.uniforms.get(U_WAVE_STRENGTH), Some(1.0));

		backdrop.set_portal_hovered(false);
		backdrop.update(&mut scene, 4.0, 2.0);
		assert_eq!(backdrop.wave_strength(), 0.0);
	}
}
