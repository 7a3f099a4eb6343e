//! Pointer handling: picking, planet dragging, camera panning and hover
//! feedback.

use glam::Vec3;
use log::{debug, info};

use super::backdrop::Backdrop;
use super::camera::Camera;
use super::host::{CursorAffordance, HostSurface, Navigator, PointerInput, to_ndc};
use super::scene::{Layer, MeshId, MeshKind, PickOwner, Plane, Ray, Scene};
use super::universe::Universe;

/// Where clicking the portal leads.
pub const ABOUT_ROUTE: &str = "/about";

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Mode {
	#[default]
	Idle,
	Dragging {
		node: String,
		plane: Plane,
	},
	Panning {
		plane: Plane,
		anchor: Vec3,
	},
}

/// Hover transitions in the order they were sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverChange {
	PlanetEnd(String),
	PlanetStart(String),
	SunEnd(String),
	SunStart(String),
}

/// Everything a pointer event may touch, borrowed for the duration of one
/// event.
pub struct InteractionContext<'a> {
	pub scene: &'a Scene,
	pub universe: Option<&'a mut Universe>,
	pub backdrop: &'a mut Backdrop,
	pub camera: &'a mut Camera,
	pub host: &'a mut dyn HostSurface,
	pub navigator: &'a mut dyn Navigator,
}

impl InteractionContext<'_> {
	fn ray(&self, input: &PointerInput) -> Ray {
		let ndc = to_ndc(input, self.host.viewport_size());
		self.camera.ray_from_ndc(ndc)
	}
}

#[derive(Debug, Default)]
pub struct InteractionController {
	mode: Mode,
	hovered_planet: Option<String>,
	hovered_sun: Option<String>,
	portal_hovered: bool,
	cursor: CursorAffordance,
}

/// Node id behind a picked mesh, if the universe knows it.
fn resolve(scene: &Scene, universe: &Universe, mesh: MeshId) -> Option<String> {
	match scene.owner(mesh)? {
		PickOwner::Node(id) => universe.node(id).map(|node| node.id.clone()),
		PickOwner::Portal => None,
	}
}

fn mesh_kind(scene: &Scene, mesh: MeshId) -> Option<MeshKind> {
	scene.mesh(mesh).map(|mesh| mesh.kind)
}

/// The constellation mesh under `ray`: the nearest planet if any, else the
/// nearest body. Hover and press both go through here so the cursor always
/// shows what a press would grab.
fn pick(scene: &Scene, ray: &Ray) -> Option<(MeshId, MeshKind)> {
	let hits = scene
		.raycast(ray, Layer::Constellation)
		.into_iter()
		.filter_map(|hit| Some((hit.mesh, mesh_kind(scene, hit.mesh)?)))
		.collect::<Vec<_>>();
	hits.iter()
		.find(|(_, kind)| *kind == MeshKind::Planet)
		.or_else(|| hits.first())
		.copied()
}

impl InteractionController {
	pub fn new() -> Self {
		Self::default()
	}

	#[cfg(test)]
	pub fn mode(&self) -> &Mode {
		&self.mode
	}

	#[cfg(test)]
	pub fn hovered_planet(&self) -> Option<&str> {
		self.hovered_planet.as_deref()
	}

	#[cfg(test)]
	pub fn hovered_sun(&self) -> Option<&str> {
		self.hovered_sun.as_deref()
	}

	#[cfg(test)]
	pub fn portal_hovered(&self) -> bool {
		self.portal_hovered
	}

	#[cfg(test)]
	pub fn cursor(&self) -> CursorAffordance {
		self.cursor
	}

	fn set_cursor(&mut self, host: &mut dyn HostSurface, cursor: CursorAffordance) {
		if self.cursor != cursor {
			self.cursor = cursor;
			host.set_cursor(cursor);
		}
	}

	pub fn pointer_down(&mut self, ctx: &mut InteractionContext<'_>, input: PointerInput) {
		// One gesture at a time; a second press waits for the release.
		if self.mode != Mode::Idle {
			debug!("pointer down ignored while {:?}", self.mode);
			return;
		}
		let ray = ctx.ray(&input);

		if !ctx.scene.raycast(&ray, Layer::Portal).is_empty() {
			info!("portal selected, navigating to {ABOUT_ROUTE}");
			ctx.navigator.navigate(ABOUT_ROUTE);
			return;
		}

		if let Some((mesh, MeshKind::Planet)) = pick(ctx.scene, &ray) {
			let Some(universe) = ctx.universe.as_deref_mut() else {
				return;
			};
			let Some(id) = resolve(ctx.scene, universe, mesh) else {
				debug!("picked planet mesh {mesh:?} has no node");
				return;
			};
			let Some(position) = universe.position(&id) else {
				return;
			};
			let pinned = Vec3::new(position.x, position.y, 0.0);
			universe.pin(&id, pinned);
			let target = universe.layout().config().drag_alpha_target;
			universe.reheat(target);
			universe.for_planet_tethers(&id, |tether| tether.drag_start());
			debug!("dragging {id}");
			self.mode = Mode::Dragging {
				node: id,
				plane: Plane::from_normal_and_point(ctx.camera.forward(), pinned),
			};
			return;
		}

		let plane = Plane::from_normal_and_point(ctx.camera.forward(), ctx.camera.target);
		let Some(anchor) = ray.intersect_plane(&plane) else {
			return;
		};
		ctx.camera.cancel_flight();
		self.mode = Mode::Panning { plane, anchor };
		self.set_cursor(ctx.host, CursorAffordance::Grabbing);
	}

	pub fn pointer_move(
		&mut self,
		ctx: &mut InteractionContext<'_>,
		input: PointerInput,
	) -> Vec<HoverChange> {
		let ray = ctx.ray(&input);
		if self.mode == Mode::Idle {
			return self.hover(ctx, &ray);
		}
		match &self.mode {
			Mode::Dragging { node, plane } => {
				if let (Some(hit), Some(universe)) =
					(ray.intersect_plane(plane), ctx.universe.as_deref_mut())
				{
					universe.pin(node, Vec3::new(hit.x, hit.y, 0.0));
					let target = universe.layout().config().drag_alpha_target;
					universe.reheat(target);
				}
				Vec::new()
			}
			Mode::Panning { plane, anchor } => {
				if let Some(hit) = ray.intersect_plane(plane) {
					ctx.camera.translate(*anchor - hit);
				}
				Vec::new()
			}
			Mode::Idle => Vec::new(),
		}
	}

	fn hover(&mut self, ctx: &mut InteractionContext<'_>, ray: &Ray) -> Vec<HoverChange> {
		let picked = ctx
			.universe
			.as_deref()
			.zip(pick(ctx.scene, ray))
			.map(|(universe, (mesh, kind))| (resolve(ctx.scene, universe, mesh), kind));
		let (planet, sun) = match picked {
			Some((id, MeshKind::Planet)) => (id, None),
			Some((id, MeshKind::Sun)) => (None, id),
			_ => (None, None),
		};

		let mut changes = self.set_hovered_planet(ctx, planet);
		changes.extend(self.set_hovered_sun(ctx, sun));

		let over_portal = !ctx.scene.raycast(ray, Layer::Portal).is_empty();
		if over_portal != self.portal_hovered {
			self.portal_hovered = over_portal;
			ctx.backdrop.set_portal_hovered(over_portal);
		}

		let cursor = if self.hovered_planet.is_some() {
			CursorAffordance::Grab
		} else if self.hovered_sun.is_some() || self.portal_hovered {
			CursorAffordance::Pointer
		} else {
			CursorAffordance::Default
		};
		self.set_cursor(ctx.host, cursor);
		changes
	}

	fn set_hovered_planet(
		&mut self,
		ctx: &mut InteractionContext<'_>,
		planet: Option<String>,
	) -> Vec<HoverChange> {
		let mut changes = Vec::new();
		if self.hovered_planet == planet {
			return changes;
		}
		if let Some(old) = self.hovered_planet.take() {
			if let Some(universe) = ctx.universe.as_deref_mut() {
				universe.for_planet_tethers(&old, |tether| tether.hover_end());
			}
			changes.push(HoverChange::PlanetEnd(old));
		}
		if let Some(new) = planet {
			if let Some(universe) = ctx.universe.as_deref_mut() {
				universe.for_planet_tethers(&new, |tether| tether.hover_start());
			}
			changes.push(HoverChange::PlanetStart(new.clone()));
			self.hovered_planet = Some(new);
		}
		changes
	}

	fn set_hovered_sun(
		&mut self,
		ctx: &mut InteractionContext<'_>,
		sun: Option<String>,
	) -> Vec<HoverChange> {
		let mut changes = Vec::new();
		if self.hovered_sun == sun {
			return changes;
		}
		if let Some(old) = self.hovered_sun.take() {
			if let Some(universe) = ctx.universe.as_deref_mut() {
				universe.sun_hover_end(&old);
			}
			changes.push(HoverChange::SunEnd(old));
		}
		if let Some(new) = sun {
			if let Some(universe) = ctx.universe.as_deref_mut() {
				universe.sun_hover_start(&new);
			}
			changes.push(HoverChange::SunStart(new.clone()));
			self.hovered_sun = Some(new);
		}
		changes
	}

	pub fn pointer_up(&mut self, ctx: &mut InteractionContext<'_>) {
		match std::mem::take(&mut self.mode) {
			Mode::Dragging { node, .. } => {
				let still_hovered = self.hovered_planet.as_deref() == Some(node.as_str());
				if let Some(universe) = ctx.universe.as_deref_mut() {
					universe.unpin(&node);
					universe.for_planet_tethers(&node, |tether| tether.drag_end(still_hovered));
					universe.cool();
				}
				debug!("released {node}");
				if !still_hovered {
					self.set_cursor(ctx.host, CursorAffordance::Default);
				}
			}
			Mode::Panning { .. } => {
				let cursor = if self.hovered_planet.is_some() {
					CursorAffordance::Grab
				} else {
					CursorAffordance::Default
				};
				self.set_cursor(ctx.host, cursor);
			}
			Mode::Idle => {}
		}
	}

	/// Ends any gesture and drops every hover, as if the pointer vanished.
	pub fn pointer_leave(&mut self, ctx: &mut InteractionContext<'_>) -> Vec<HoverChange> {
		self.pointer_up(ctx);
		let mut changes = self.set_hovered_planet(ctx, None);
		changes.extend(self.set_hovered_sun(ctx, None));
		if self.portal_hovered {
			self.portal_hovered = false;
			ctx.backdrop.set_portal_hovered(false);
		}
		self.set_cursor(ctx.host, CursorAffordance::Default);
		changes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::constellation::config::{
		CameraConfig, GalaxyConfig, SimulationConfig, TetherConfig,
	};
	use crate::components::constellation::host::testing::{RecordingHost, RecordingNavigator};
	use crate::components::constellation::tether::TetherState;
	use crate::components::constellation::types::{ProjectRecord, SUNS};

	const WIDTH: f32 = 800.0;
	const HEIGHT: f32 = 600.0;

	struct Rig {
		scene: Scene,
		universe: Universe,
		backdrop: Backdrop,
		camera: Camera,
		host: RecordingHost,
		navigator: RecordingNavigator,
		controller: InteractionController,
		frame: u32,
	}

	impl Rig {
		fn new(projects: &[ProjectRecord]) -> Self {
			let mut scene = Scene::new();
			let universe = Universe::build(
				Some(projects),
				&mut scene,
				SimulationConfig::default(),
				TetherConfig::default(),
				42,
			);
			let galaxy = GalaxyConfig {
				count: 10,
				star_layers: Vec::new(),
				..GalaxyConfig::default()
			};
			let backdrop = Backdrop::new(galaxy, &mut scene, 1);
			Self {
				scene,
				universe,
				backdrop,
				camera: Camera::new(&CameraConfig::default(), WIDTH / HEIGHT),
				host: RecordingHost::new(WIDTH, HEIGHT),
				navigator: RecordingNavigator::default(),
				controller: InteractionController::new(),
				frame: 0,
			}
		}

		fn split(&mut self) -> (&mut InteractionController, InteractionContext<'_>) {
			(
				&mut self.controller,
				InteractionContext {
					scene: &self.scene,
					universe: Some(&mut self.universe),
					backdrop: &mut self.backdrop,
					camera: &mut self.camera,
					host: &mut self.host,
					navigator: &mut self.navigator,
				},
			)
		}

		fn down(&mut self, input: PointerInput) {
			let (controller, mut ctx) = self.split();
			controller.pointer_down(&mut ctx, input);
		}

		fn moved(&mut self, input: PointerInput) -> Vec<HoverChange> {
			let (controller, mut ctx) = self.split();
			controller.pointer_move(&mut ctx, input)
		}

		fn up(&mut self) {
			let (controller, mut ctx) = self.split();
			controller.pointer_up(&mut ctx);
		}

		fn leave(&mut self) -> Vec<HoverChange> {
			let (controller, mut ctx) = self.split();
			controller.pointer_leave(&mut ctx)
		}

		/// Screen pixel over a world point.
		fn pixel(&self, world: Vec3) -> PointerInput {
			let ndc = self.camera.project(world).unwrap();
			PointerInput::new((ndc.x + 1.0) * 0.5 * WIDTH, (1.0 - ndc.y) * 0.5 * HEIGHT)
		}

		fn pixel_of(&self, id: &str) -> PointerInput {
			self.pixel(self.universe.position(id).unwrap())
		}

		fn run_frames(&mut self, count: usize) {
			for _ in 0..count {
				self.frame += 1;
				self.universe.tick(&mut self.scene, self.frame as f32 / 60.0);
			}
		}

		/// Ticks until the layout stops on its own.
		fn cool_down(&mut self) {
			self.run_frames(600);
			assert!(!self.universe.layout().is_running());
		}

		fn tether_states(&self, planet: &str) -> Vec<TetherState> {
			self.universe
				.tethers()
				.iter()
				.filter(|tether| tether.planet_id == planet)
				.map(|tether| tether.state())
				.collect()
		}
	}

	fn empty_space() -> PointerInput {
		PointerInput::new(5.0, 5.0)
	}

	#[test]
	fn drag_and_release_round_trip() {
		let mut rig = Rig::new(&[ProjectRecord::new("p1", &["Design", "Development"])]);
		rig.cool_down();
		let start = rig.universe.position("p1").unwrap();

		rig.down(rig.pixel_of("p1"));
		assert!(matches!(rig.controller.mode(), Mode::Dragging { node, .. } if node == "p1"));
		assert_eq!(
			rig.universe.pinned("p1"),
			Some(Vec3::new(start.x, start.y, 0.0))
		);
		assert_eq!(rig.tether_states("p1"), [TetherState::Dragged; 2]);
		// Grabbing wakes a layout that had already come to rest.
		assert!(rig.universe.layout().is_running());
		assert_eq!(rig.universe.layout().alpha_target(), 0.3);

		let target = Vec3::new(-5.0, -8.0, 0.0);
		assert!(rig.moved(rig.pixel(target)).is_empty());
		let pinned = rig.universe.pinned("p1").unwrap();
		assert!((pinned - target).length() < 1e-2, "{pinned:?}");
		assert_eq!(pinned.z, 0.0);
		assert_eq!(rig.universe.layout().alpha_target(), 0.3);
		rig.run_frames(30);
		assert_eq!(rig.universe.position("p1"), Some(pinned));

		rig.up();
		assert_eq!(rig.controller.mode(), &Mode::Idle);
		assert_eq!(rig.universe.pinned("p1"), None);
		assert_eq!(rig.universe.layout().alpha_target(), 0.0);
		assert_eq!(rig.tether_states("p1"), [TetherState::Idle; 2]);
		assert_eq!(rig.host.cursor(), CursorAffordance::Default);

		rig.run_frames(5);
		assert_ne!(rig.universe.position("p1"), Some(pinned));
	}

	#[test]
	fn press_and_release_on_a_resting_layout_lets_the_node_move() {
		let mut rig = Rig::new(&[ProjectRecord::new("p1", &["Design", "Development"])]);
		rig.cool_down();
		let start = rig.universe.position("p1").unwrap();

		rig.down(rig.pixel_of("p1"));
		rig.run_frames(30);
		assert!(rig.universe.alpha() > rig.universe.layout().config().alpha_min);
		rig.up();
		assert_eq!(rig.universe.pinned("p1"), None);

		rig.run_frames(100);
		assert_ne!(rig.universe.position("p1"), Some(start));
	}

	#[test]
	fn second_press_during_a_drag_is_ignored() {
		let mut rig = Rig::new(&[
			ProjectRecord::new("p1", &["Design"]),
			ProjectRecord::new("p2", &["Development"]),
		]);

		rig.down(rig.pixel_of("p1"));
		rig.down(rig.pixel_of("p2"));
		assert!(matches!(rig.controller.mode(), Mode::Dragging { node, .. } if node == "p1"));
		assert_eq!(rig.universe.pinned("p2"), None);
		assert_eq!(rig.tether_states("p2"), [TetherState::Idle]);

		rig.up();
		assert_eq!(rig.controller.mode(), &Mode::Idle);
		assert_eq!(rig.universe.pinned("p1"), None);
		assert_eq!(rig.universe.pinned("p2"), None);
		assert_eq!(rig.tether_states("p1"), [TetherState::Idle]);
		assert_eq!(rig.tether_states("p2"), [TetherState::Idle]);
	}

	#[test]
	fn planet_behind_a_sun_is_both_hovered_and_grabbed() {
		let mut rig = Rig::new(&[ProjectRecord::new("p1", &["Design"])]);
		let sun = SUNS[0].anchor;
		let behind = sun + (sun - rig.camera.position).normalize() * 6.0;
		rig.universe.pin("p1", behind);
		rig.universe.tick(&mut rig.scene, 0.0);
		rig.universe.unpin("p1");

		assert_eq!(
			rig.moved(rig.pixel(sun)),
			[HoverChange::PlanetStart("p1".into())]
		);
		assert_eq!(rig.controller.hovered_sun(), None);
		assert_eq!(rig.host.cursor(), CursorAffordance::Grab);

		rig.down(rig.pixel(sun));
		assert!(matches!(rig.controller.mode(), Mode::Dragging { node, .. } if node == "p1"));
	}

	#[test]
	fn hover_is_exclusive_and_ends_before_starting() {
		let mut rig = Rig::new(&[
			ProjectRecord::new("p1", &["Design"]),
			ProjectRecord::new("p2", &["Development"]),
		]);

		assert_eq!(
			rig.moved(rig.pixel_of("p1")),
			[HoverChange::PlanetStart("p1".into())]
		);
		assert_eq!(rig.host.cursor(), CursorAffordance::Grab);
		assert_eq!(rig.tether_states("p1"), [TetherState::Hovered]);

		assert_eq!(
			rig.moved(rig.pixel_of("p2")),
			[
				HoverChange::PlanetEnd("p1".into()),
				HoverChange::PlanetStart("p2".into())
			]
		);
		assert_eq!(rig.tether_states("p1"), [TetherState::Idle]);
		assert_eq!(rig.tether_states("p2"), [TetherState::Hovered]);

		assert_eq!(
			rig.moved(rig.pixel(SUNS[0].anchor)),
			[
				HoverChange::PlanetEnd("p2".into()),
				HoverChange::SunStart("Design".into())
			]
		);
		assert_eq!(rig.controller.hovered_planet(), None);
		assert_eq!(rig.controller.hovered_sun(), Some("Design"));
		assert_eq!(rig.host.cursor(), CursorAffordance::Pointer);

		assert_eq!(
			rig.moved(rig.pixel(SUNS[1].anchor)),
			[
				HoverChange::SunEnd("Design".into()),
				HoverChange::SunStart("Development".into())
			]
		);
	}

	#[test]
	fn ray_miss_clears_hover() {
		let mut rig = Rig::new(&[ProjectRecord::new("p1", &["Design"])]);
		rig.moved(rig.pixel_of("p1"));
		assert_eq!(
			rig.moved(empty_space()),
			[HoverChange::PlanetEnd("p1".into())]
		);
		assert_eq!(rig.controller.hovered_planet(), None);
		assert_eq!(rig.controller.hovered_sun(), None);
		assert_eq!(rig.host.cursor(), CursorAffordance::Default);
	}

	#[test]
	fn portal_click_navigates_and_hover_waves() {
		let mut rig = Rig::new(&[]);
		let center = rig.pixel(Vec3::ZERO);

		rig.moved(center);
		assert!(rig.controller.portal_hovered());
		assert_eq!(rig.host.cursor(), CursorAffordance::Pointer);
		rig.backdrop.update(&mut rig.scene, 5.0, 5.0);
		assert_eq!(rig.backdrop.wave_strength(), 1.0);

		rig.down(center);
		assert_eq!(rig.navigator.routes, [ABOUT_ROUTE]);
		assert_eq!(rig.controller.mode(), &Mode::Idle);
	}

	#[test]
	fn background_drag_pans_the_camera() {
		let mut rig = Rig::new(&[]);
		let before = (rig.camera.position, rig.camera.target);

		rig.down(PointerInput::new(700.0, 500.0));
		assert!(matches!(rig.controller.mode(), Mode::Panning { .. }));
		assert_eq!(rig.host.cursor(), CursorAffordance::Grabbing);

		rig.moved(PointerInput::new(600.0, 500.0));
		let delta = rig.camera.position - before.0;
		assert!(delta.x > 0.0, "dragging left moves the view right: {delta:?}");
		assert!(delta.y.abs() < 1e-3);
		assert!((rig.camera.target - before.1 - delta).length() < 1e-4);

		rig.up();
		assert_eq!(rig.controller.mode(), &Mode::Idle);
		assert_eq!(rig.host.cursor(), CursorAffordance::Default);
	}

	#[test]
	fn unresolvable_planet_is_ignored() {
		let mut rig = Rig::new(&[]);
		let ghost = Vec3::new(30.0, -25.0, 0.0);
		rig.scene.spawn(
			MeshKind::Planet,
			Layer::Constellation,
			ghost,
			1.5,
			[1.0; 3],
			PickOwner::Node("ghost".into()),
		);
		rig.down(rig.pixel(ghost));
		assert_eq!(rig.controller.mode(), &Mode::Idle);
		assert!(rig.navigator.routes.is_empty());
		assert!(rig.host.cursors.is_empty());
	}

	#[test]
	fn leaving_mid_drag_releases_and_clears() {
		let mut rig = Rig::new(&[ProjectRecord::new("p1", &["Design"])]);
		rig.moved(rig.pixel_of("p1"));
		rig.down(rig.pixel_of("p1"));
		assert!(rig.universe.pinned("p1").is_some());

		assert_eq!(rig.leave(), [HoverChange::PlanetEnd("p1".into())]);
		assert_eq!(rig.controller.mode(), &Mode::Idle);
		assert_eq!(rig.universe.pinned("p1"), None);
		assert_eq!(rig.tether_states("p1"), [TetherState::Idle]);
		assert_eq!(rig.host.cursor(), CursorAffordance::Default);
	}
}
