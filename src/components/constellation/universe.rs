//! The constellation graph: suns, planets and the tethers between them.
//!
//! Owns the layout engine. Node state in the engine is the single source of
//! truth for positions; mesh transforms are written from it every tick and
//! never read back.

use std::collections::HashMap;

use glam::Vec3;
use log::{error, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::{SimulationConfig, TetherConfig};
use super::scene::{Layer, MeshId, MeshKind, PickOwner, Scene, U_ANIMATION_SPEED, U_TIME};
use super::simulation::{ForceLayout, SimulationEvent};
use super::tether::{Tether, TetherEnd};
use super::tween::{Easing, Tweened};
use super::types::{NodeKind, ProjectRecord, SUNS, planet_color, sun_spec};

pub const SUN_RADIUS: f32 = 3.5;
pub const DEFAULT_PLANET_RADIUS: f32 = 1.5;
const SUN_IDLE_SPEED: f32 = 1.0;
const SUN_HOVER_SPEED: f32 = 2.5;
const SUN_HOVER_DURATION: f32 = 0.4;

#[derive(Clone, Debug)]
pub struct Node {
	pub id: String,
	pub kind: NodeKind,
	pub mesh: MeshId,
	slot: usize,
}

impl Node {
	pub fn is_sun(&self) -> bool {
		matches!(self.kind, NodeKind::Sun(_))
	}

	pub fn is_planet(&self) -> bool {
		matches!(self.kind, NodeKind::Planet(_))
	}

	/// Suns never leave their anchor.
	pub fn is_fixed(&self) -> bool {
		self.is_sun()
	}
}

/// A spring between a planet (`source`) and one of its suns (`target`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	pub source: String,
	pub target: String,
}

struct SunPulse {
	mesh: MeshId,
	speed: Tweened,
}

pub struct Universe {
	nodes: Vec<Node>,
	links: Vec<Link>,
	tethers: Vec<Tether>,
	index_by_id: HashMap<String, usize>,
	sun_pulses: HashMap<String, SunPulse>,
	layout: ForceLayout,
	last_elapsed: Option<f32>,
}

impl Universe {
	/// Builds the graph and spawns its meshes into `scene`.
	///
	/// `None` means the project data never arrived; the graph still gets its
	/// suns so the page has something to show.
	pub fn build(
		projects: Option<&[ProjectRecord]>,
		scene: &mut Scene,
		simulation: SimulationConfig,
		tether: TetherConfig,
		seed: u64,
	) -> Self {
		let mut universe = Self {
			nodes: Vec::new(),
			links: Vec::new(),
			tethers: Vec::new(),
			index_by_id: HashMap::new(),
			sun_pulses: HashMap::new(),
			layout: ForceLayout::new(simulation, seed),
			last_elapsed: None,
		};

		for sun in &SUNS {
			let slot = universe.layout.add_node(sun.anchor, simulation.sun_charge);
			universe.layout.pin(slot, sun.anchor);
			let mesh = scene.spawn(
				MeshKind::Sun,
				Layer::Constellation,
				sun.anchor,
				SUN_RADIUS,
				sun.core,
				PickOwner::Node(sun.id.to_owned()),
			);
			universe.sun_pulses.insert(
				sun.id.to_owned(),
				SunPulse {
					mesh,
					speed: Tweened::new(SUN_IDLE_SPEED),
				},
			);
			universe.push_node(sun.id.to_owned(), NodeKind::Sun(sun), mesh, slot);
		}

		let Some(projects) = projects else {
			error!("project data unavailable; building constellation with suns only");
			return universe;
		};

		let mut rng = SmallRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
		for record in projects {
			if universe.index_by_id.contains_key(&record.id) {
				warn!("skipping project {:?}: id already in use", record.id);
				continue;
			}
			if record.categories.is_empty() {
				warn!("project {:?} declares no categories", record.id);
			}

			let start = spawn_position(universe.nodes.len(), &mut rng);
			let slot = universe.layout.add_node(start, simulation.planet_charge);
			let radius = record.size.filter(|size| *size > 0.0).unwrap_or(DEFAULT_PLANET_RADIUS);
			let mesh = scene.spawn(
				MeshKind::Planet,
				Layer::Constellation,
				start,
				radius,
				planet_color(&record.categories),
				PickOwner::Node(record.id.clone()),
			);
			universe.push_node(record.id.clone(), NodeKind::Planet(record.clone()), mesh, slot);

			for category in &record.categories {
				universe.link(record, category, tether);
			}
		}

		info!(
			"constellation built: {} nodes, {} links",
			universe.nodes.len(),
			universe.links.len()
		);
		universe
	}

	fn push_node(&mut self, id: String, kind: NodeKind, mesh: MeshId, slot: usize) {
		self.index_by_id.insert(id.clone(), self.nodes.len());
		self.nodes.push(Node {
			id,
			kind,
			mesh,
			slot,
		});
	}

	fn link(&mut self, record: &ProjectRecord, category: &str, config: TetherConfig) {
		let Some(spec) = sun_spec(category) else {
			warn!("project {:?}: unknown category {:?}", record.id, category);
			return;
		};
		let (Some(sun), Some(planet)) = (self.node(spec.id), self.node(&record.id)) else {
			return;
		};
		let sun_end = TetherEnd {
			node: sun.slot,
			mesh: sun.mesh,
		};
		let planet_end = TetherEnd {
			node: planet.slot,
			mesh: planet.mesh,
		};

		if !self.layout.add_link(planet_end.node, sun_end.node) {
			return;
		}
		self.links.push(Link {
			source: record.id.clone(),
			target: spec.id.to_owned(),
		});
		self.tethers.push(Tether::new(
			&record.id,
			sun_end,
			planet_end,
			spec.core,
			config,
		));
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn tethers(&self) -> &[Tether] {
		&self.tethers
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index_by_id.get(id).map(|&index| &self.nodes[index])
	}

	pub fn node_for_mesh(&self, mesh: MeshId) -> Option<&Node> {
		self.nodes.iter().find(|node| node.mesh == mesh)
	}

	pub fn planets(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter().filter(|node| node.is_planet())
	}

	pub fn suns(&self) -> impl Iterator<Item = &Node> {
		self.nodes.iter().filter(|node| node.is_sun())
	}

	pub fn mesh_ids(&self) -> impl Iterator<Item = MeshId> + '_ {
		self.nodes.iter().map(|node| node.mesh)
	}

	pub fn position(&self, id: &str) -> Option<Vec3> {
		self.node(id).and_then(|node| self.layout.position(node.slot))
	}

	pub fn pinned(&self, id: &str) -> Option<Vec3> {
		self.node(id).and_then(|node| self.layout.pinned(node.slot))
	}

	pub fn layout(&self) -> &ForceLayout {
		&self.layout
	}

	pub fn alpha(&self) -> f32 {
		self.layout.alpha()
	}

	/// Pins a planet. Suns are already pinned to their anchors and ignore this.
	pub fn pin(&mut self, id: &str, position: Vec3) -> bool {
		let Some(node) = self.node(id).filter(|node| !node.is_fixed()) else {
			return false;
		};
		let slot = node.slot;
		self.layout.pin(slot, position);
		true
	}

	pub fn unpin(&mut self, id: &str) {
		if let Some(node) = self.node(id).filter(|node| !node.is_fixed()) {
			let slot = node.slot;
			self.layout.unpin(slot);
		}
	}

	/// Raises the alpha target and wakes the layout so linked nodes follow.
	pub fn reheat(&mut self, target: f32) {
		self.layout.set_alpha_target(target);
		self.layout.restart();
	}

	pub fn cool(&mut self) {
		self.layout.set_alpha_target(0.0);
	}

	/// Runs `f` on every tether attached to `planet_id`.
	pub fn for_planet_tethers(&mut self, planet_id: &str, mut f: impl FnMut(&mut Tether)) {
		self.tethers
			.iter_mut()
			.filter(|tether| tether.planet_id == planet_id)
			.for_each(&mut f);
	}

	pub fn sun_hover_start(&mut self, id: &str) {
		if let Some(pulse) = self.sun_pulses.get_mut(id) {
			pulse
				.speed
				.animate_to(SUN_HOVER_SPEED, SUN_HOVER_DURATION, Easing::OutQuad);
		}
	}

	pub fn sun_hover_end(&mut self, id: &str) {
		if let Some(pulse) = self.sun_pulses.get_mut(id) {
			pulse
				.speed
				.animate_to(SUN_IDLE_SPEED, SUN_HOVER_DURATION, Easing::OutQuad);
		}
	}

	pub fn sun_animation_speed(&self, id: &str) -> Option<f32> {
		self.sun_pulses.get(id).map(|pulse| pulse.speed.get())
	}

	/// One frame: step the layout, project node state onto meshes, then
	/// advance tethers and sun uniforms.
	pub fn tick(&mut self, scene: &mut Scene, elapsed: f32) -> Option<SimulationEvent> {
		let dt = self.last_elapsed.map_or(0.0, |last| (elapsed - last).max(0.0));
		self.last_elapsed = Some(elapsed);

		let event = self.layout.tick();

		for node in &self.nodes {
			if let Some(position) = self.layout.position(node.slot) {
				scene.set_position(node.mesh, position);
			}
		}

		for tether in &mut self.tethers {
			let sun = self.layout.position(tether.sun.node).unwrap_or(Vec3::ZERO);
			let planet = self.layout.position(tether.planet.node).unwrap_or(Vec3::ZERO);
			tether.update(elapsed, sun, planet);
		}

		for pulse in self.sun_pulses.values_mut() {
			pulse.speed.advance(dt);
			if let Some(mesh) = scene.mesh_mut(pulse.mesh) {
				mesh.uniforms.set(U_TIME, elapsed);
				mesh.uniforms.set(U_ANIMATION_SPEED, pulse.speed.get());
			}
		}

		event
	}
}

/// Phyllotaxis spread in the xy plane with a little depth so the planar force
/// has something to do.
fn spawn_position(index: usize, rng: &mut SmallRng) -> Vec3 {
	let radius = 10.0 * (0.5 + index as f32).sqrt();
	let angle = index as f32 * std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
	let depth = (rng.r#gen::<f32>() - 0.5) * 4.0;
	Vec3::new(radius * angle.cos(), radius * angle.sin(), depth)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build(projects: Option<&[ProjectRecord]>) -> (Universe, Scene) {
		let mut scene = Scene::new();
		let universe = Universe::build(
			projects,
			&mut scene,
			SimulationConfig::default(),
			TetherConfig::default(),
			42,
		);
		(universe, scene)
	}

	#[test]
	fn empty_project_list_yields_only_suns() {
		let (universe, scene) = build(Some(&[]));
		assert_eq!(universe.suns().count(), SUNS.len());
		assert_eq!(universe.planets().count(), 0);
		assert!(universe.links().is_empty());
		assert!(universe.tethers().is_empty());
		assert_eq!(scene.meshes().len(), SUNS.len());
	}

	#[test]
	fn missing_data_degrades_to_suns() {
		let (universe, _) = build(None);
		assert_eq!(universe.nodes().len(), SUNS.len());
		assert!(universe.links().is_empty());
	}

	#[test]
	fn one_link_and_tether_per_category() {
		let projects = [ProjectRecord::new("p1", &["Design", "Development"])];
		let (universe, _) = build(Some(&projects));

		assert_eq!(universe.planets().count(), 1);
		assert_eq!(
			universe.links(),
			&[
				Link {
					source: "p1".into(),
					target: "Design".into()
				},
				Link {
					source: "p1".into(),
					target: "Development".into()
				},
			]
		);
		assert_eq!(universe.tethers().len(), 2);
		assert!(universe.tethers().iter().all(|t| t.planet_id == "p1"));
	}

	#[test]
	fn bad_records_do_not_stop_the_build() {
		let projects = [
			ProjectRecord::new("p1", &["Cooking", "Design"]),
			ProjectRecord::new("p1", &["Development"]),
			ProjectRecord::new("Design", &["Design"]),
			ProjectRecord::new("p2", &[]),
			ProjectRecord::new("p3", &["Video Editing", "Video Editing"]),
		];
		let (universe, _) = build(Some(&projects));

		let planets = universe.planets().map(|n| n.id.as_str()).collect::<Vec<_>>();
		assert_eq!(planets, ["p1", "p2", "p3"]);
		// Duplicate categories give independent springs.
		assert_eq!(universe.links().len(), 3);
		assert_eq!(universe.tethers().len(), 3);
	}

	#[test]
	fn build_does_not_touch_input() {
		let projects = vec![ProjectRecord::new("p1", &["Design"])];
		let before = projects.clone();
		let _ = build(Some(&projects));
		assert_eq!(projects, before);
	}

	#[test]
	fn tick_projects_node_state_onto_meshes() {
		let projects = [ProjectRecord::new("p1", &["Design"])];
		let (mut universe, mut scene) = build(Some(&projects));
		for frame in 0..30 {
			universe.tick(&mut scene, frame as f32 / 60.0);
		}

		for node in universe.nodes() {
			let mesh = scene.mesh(node.mesh).unwrap();
			assert_eq!(Some(mesh.position), universe.position(&node.id));
		}
		let design = universe.node("Design").unwrap();
		assert_eq!(universe.node_for_mesh(design.mesh).map(|n| n.id.as_str()), Some("Design"));
		assert_eq!(universe.position("Design"), Some(SUNS[0].anchor));
		let sun_mesh = scene.mesh(design.mesh).unwrap();
		assert_eq!(sun_mesh.uniforms.get(U_TIME), Some(29.0 / 60.0));

		let tether = &universe.tethers()[0];
		assert_eq!(tether.points()[0], SUNS[0].anchor);
		assert_eq!(*tether.points().last().unwrap(), universe.position("p1").unwrap());
	}

	#[test]
	fn suns_cannot_be_unpinned_or_moved() {
		let (mut universe, mut scene) = build(Some(&[]));
		assert!(!universe.pin("Design", Vec3::ZERO));
		universe.unpin("Design");
		universe.tick(&mut scene, 0.0);
		assert_eq!(universe.pinned("Design"), Some(SUNS[0].anchor));
	}

	#[test]
	fn sun_hover_eases_animation_speed() {
		let (mut universe, mut scene) = build(Some(&[]));
		universe.tick(&mut scene, 0.0);
		universe.sun_hover_start("Development");
		universe.tick(&mut scene, 1.0);
		assert_eq!(universe.sun_animation_speed("Development"), Some(SUN_HOVER_SPEED));
		universe.sun_hover_end("Development");
		universe.tick(&mut scene, 2.0);
		assert_eq!(universe.sun_animation_speed("Development"), Some(SUN_IDLE_SPEED));
	}
}
