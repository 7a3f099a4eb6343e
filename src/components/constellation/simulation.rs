//! Force-directed layout in three dimensions.
//!
//! Velocity Verlet integration with a cooling `alpha`, in the manner of
//! d3-force: link springs, pairwise charge, a weak pull to the origin and a
//! flattening pull toward z = 0. Pinned nodes are held at their override.

use glam::Vec3;
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::SimulationConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub position: Vec3,
	pub velocity: Vec3,
	pub pinned: Option<Vec3>,
	/// Many-body strength; negative repels.
	pub charge: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimLink {
	pub source: usize,
	pub target: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationEvent {
	/// Alpha just crossed below the settle threshold.
	Settled,
}

pub struct ForceLayout {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	degree: Vec<u32>,
	config: SimulationConfig,
	alpha: f32,
	alpha_target: f32,
	alpha_decay: f32,
	running: bool,
	rng: SmallRng,
}

impl ForceLayout {
	pub fn new(config: SimulationConfig, seed: u64) -> Self {
		Self {
			nodes: Vec::new(),
			links: Vec::new(),
			degree: Vec::new(),
			alpha_decay: config.alpha_decay(),
			config,
			alpha: 1.0,
			alpha_target: 0.0,
			running: true,
			rng: SmallRng::seed_from_u64(seed),
		}
	}

	pub fn add_node(&mut self, position: Vec3, charge: f32) -> usize {
		self.nodes.push(SimNode {
			position,
			velocity: Vec3::ZERO,
			pinned: None,
			charge,
		});
		self.degree.push(0);
		self.nodes.len() - 1
	}

	/// Adds a spring between two nodes. Returns `false` for self-links and
	/// out-of-range endpoints.
	pub fn add_link(&mut self, source: usize, target: usize) -> bool {
		let count = self.nodes.len();
		if source >= count || target >= count || source == target {
			return false;
		}
		self.links.push(SimLink { source, target });
		self.degree[source] += 1;
		self.degree[target] += 1;
		true
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub fn position(&self, index: usize) -> Option<Vec3> {
		self.nodes.get(index).map(|node| node.position)
	}

	pub fn pinned(&self, index: usize) -> Option<Vec3> {
		self.nodes.get(index).and_then(|node| node.pinned)
	}

	/// Holds a node at `position`. The node jumps there immediately.
	pub fn pin(&mut self, index: usize, position: Vec3) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.pinned = Some(position);
			node.position = position;
			node.velocity = Vec3::ZERO;
		}
	}

	pub fn unpin(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.pinned = None;
		}
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn alpha(&self) -> f32 {
		self.alpha
	}

	pub fn set_alpha(&mut self, alpha: f32) {
		self.alpha = alpha.clamp(0.0, 1.0);
	}

	pub fn alpha_target(&self) -> f32 {
		self.alpha_target
	}

	pub fn set_alpha_target(&mut self, target: f32) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	/// Resumes ticking without touching positions or alpha.
	pub fn restart(&mut self) {
		if !self.running {
			debug!("layout restarted at alpha {:.3}", self.alpha);
		}
		self.running = true;
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.settle_threshold
	}

	pub fn tick(&mut self) -> Option<SimulationEvent> {
		if !self.running || self.nodes.is_empty() {
			return None;
		}

		let was_settled = self.is_settled();
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_centering(alpha);
		self.integrate();

		if self.alpha < self.config.alpha_min {
			self.running = false;
			debug!("layout cooled below alpha_min; stopping");
		}

		(!was_settled && self.is_settled()).then_some(SimulationEvent::Settled)
	}

	fn jiggle(&mut self) -> Vec3 {
		Vec3::new(
			self.rng.r#gen::<f32>() - 0.5,
			self.rng.r#gen::<f32>() - 0.5,
			self.rng.r#gen::<f32>() - 0.5,
		) * 1e-6
	}

	fn apply_links(&mut self, alpha: f32) {
		let strength = self.config.link_strength;
		let distance = self.config.link_distance;
		for index in 0..self.links.len() {
			let SimLink { source, target } = self.links[index];
			let source_node = &self.nodes[source];
			let target_node = &self.nodes[target];
			let mut delta = (target_node.position + target_node.velocity)
				- (source_node.position + source_node.velocity);
			if delta.length_squared() < 1e-12 {
				delta = self.jiggle();
			}
			let length = delta.length();
			let delta = delta * ((length - distance) / length * alpha * strength);

			let source_degree = self.degree[source] as f32;
			let target_degree = self.degree[target] as f32;
			let bias = source_degree / (source_degree + target_degree);

			self.nodes[target].velocity -= delta * bias;
			self.nodes[source].velocity += delta * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self, alpha: f32) {
		let distance_min_sq = self.config.distance_min_sq;
		for index in 0..self.nodes.len() {
			let mut force = Vec3::ZERO;
			for other in 0..self.nodes.len() {
				if other == index {
					continue;
				}
				let mut delta = self.nodes[other].position - self.nodes[index].position;
				let mut distance_sq = delta.length_squared();
				if distance_sq < 1e-12 {
					delta = self.jiggle();
					distance_sq = delta.length_squared();
				}
				if distance_sq < distance_min_sq {
					distance_sq = (distance_min_sq * distance_sq).sqrt();
				}
				force += delta * (self.nodes[other].charge * alpha / distance_sq);
			}
			self.nodes[index].velocity += force;
		}
	}

	fn apply_centering(&mut self, alpha: f32) {
		let center = self.config.center_strength * alpha;
		let plane = self.config.plane_strength * alpha;
		for node in &mut self.nodes {
			node.velocity -= node.position * center;
			node.velocity.z += (0.0 - node.position.z) * plane;
		}
	}

	fn integrate(&mut self) {
		let retain = 1.0 - self.config.velocity_decay;
		for node in &mut self.nodes {
			match node.pinned {
				Some(pinned) => {
					node.position = pinned;
					node.velocity = Vec3::ZERO;
				}
				None => {
					node.velocity *= retain;
					node.position += node.velocity;
				}
			}
		}
	}
}
