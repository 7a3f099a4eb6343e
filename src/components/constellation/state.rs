use log::{info, warn};

use super::backdrop::Backdrop;
use super::camera::{Camera, CameraFramer};
use super::config::ConstellationConfig;
use super::host::{HostSurface, ListenerKind, Navigator, PointerInput};
use super::interaction::{HoverChange, InteractionContext, InteractionController};
use super::scene::Scene;
use super::simulation::SimulationEvent;
use super::types::ProjectRecord;
use super::universe::Universe;

const ZOOM_STEP: f32 = 1.1;

/// Everything the canvas needs between frames.
///
/// The universe is absent until project data has been loaded; the backdrop and
/// camera run from the start. After [`teardown`](Self::teardown) every
/// operation is a no-op.
pub struct ConstellationState<H, N> {
	host: H,
	navigator: N,
	config: ConstellationConfig,
	seed: u64,
	pub scene: Scene,
	pub universe: Option<Universe>,
	pub backdrop: Backdrop,
	pub camera: Camera,
	framer: CameraFramer,
	controller: InteractionController,
	last_elapsed: Option<f32>,
	attached: bool,
	torn_down: bool,
}

impl<H: HostSurface, N: Navigator> ConstellationState<H, N> {
	pub fn new(host: H, navigator: N, config: ConstellationConfig, seed: u64) -> Self {
		let (width, height) = host.viewport_size();
		let mut scene = Scene::new();
		let backdrop = Backdrop::new(config.galaxy.clone(), &mut scene, seed);
		let camera = Camera::new(&config.camera, width / height);
		Self {
			host,
			navigator,
			config,
			seed,
			scene,
			universe: None,
			backdrop,
			camera,
			framer: CameraFramer::new(),
			controller: InteractionController::new(),
			last_elapsed: None,
			attached: false,
			torn_down: false,
		}
	}

	#[cfg(test)]
	pub fn host(&self) -> &H {
		&self.host
	}

	#[cfg(test)]
	pub fn framer(&self) -> &CameraFramer {
		&self.framer
	}

	#[cfg(test)]
	pub fn config(&self) -> &ConstellationConfig {
		&self.config
	}

	pub fn viewport_size(&self) -> (f32, f32) {
		self.host.viewport_size()
	}

	pub fn attach(&mut self) {
		if self.torn_down || self.attached {
			return;
		}
		for kind in ListenerKind::ALL {
			self.host.add_listener(kind);
		}
		self.attached = true;
	}

	/// Builds the universe. `None` means the data could not be loaded; the
	/// universe then holds only its suns.
	pub fn load(
		&mut self,
		projects: Option<&[ProjectRecord]>,
		settings: Option<ConstellationConfig>,
	) {
		if self.torn_down {
			return;
		}
		if self.universe.is_some() {
			warn!("constellation already loaded; ignoring new data");
			return;
		}
		if let Some(settings) = settings {
			self.apply_settings(settings);
		}

		self.universe = Some(Universe::build(
			projects,
			&mut self.scene,
			self.config.simulation,
			self.config.tether,
			self.seed,
		));
		self.framer.arm();
	}

	fn apply_settings(&mut self, settings: ConstellationConfig) {
		if settings.galaxy != self.config.galaxy {
			self.scene.despawn(self.backdrop.portal());
			self.backdrop = Backdrop::new(settings.galaxy.clone(), &mut self.scene, self.seed);
		}
		if settings.camera != self.config.camera {
			let (width, height) = self.host.viewport_size();
			self.camera = Camera::new(&settings.camera, width / height);
		}
		info!("applied constellation settings");
		self.config = settings;
	}

	pub fn frame(&mut self, elapsed: f32) {
		if self.torn_down {
			return;
		}
		let dt = self
			.last_elapsed
			.map_or(0.0, |last| (elapsed - last).max(0.0));
		self.last_elapsed = Some(elapsed);

		if let Some(universe) = self.universe.as_mut() {
			if universe.tick(&mut self.scene, elapsed) == Some(SimulationEvent::Settled) {
				let bounds = self.scene.bounds(universe.mesh_ids());
				self.framer
					.notify_settled(&mut self.camera, bounds, &self.config.camera);
			}
		}
		self.backdrop.update(&mut self.scene, elapsed, dt);
		self.camera.update(dt);
	}

	fn interact<R: Default>(
		&mut self,
		f: impl FnOnce(&mut InteractionController, &mut InteractionContext<'_>) -> R,
	) -> R {
		if self.torn_down {
			return R::default();
		}
		let mut ctx = InteractionContext {
			scene: &self.scene,
			universe: self.universe.as_mut(),
			backdrop: &mut self.backdrop,
			camera: &mut self.camera,
			host: &mut self.host,
			navigator: &mut self.navigator,
		};
		f(&mut self.controller, &mut ctx)
	}

	pub fn pointer_down(&mut self, input: PointerInput) {
		self.interact(|controller, ctx| controller.pointer_down(ctx, input));
	}

	pub fn pointer_move(&mut self, input: PointerInput) -> Vec<HoverChange> {
		self.interact(|controller, ctx| controller.pointer_move(ctx, input))
	}

	pub fn pointer_up(&mut self) {
		self.interact(|controller, ctx| controller.pointer_up(ctx));
	}

	pub fn pointer_leave(&mut self) -> Vec<HoverChange> {
		self.interact(|controller, ctx| controller.pointer_leave(ctx))
	}

	/// Wheel zoom: positive deltas move away.
	pub fn zoom(&mut self, delta_y: f64) {
		if self.torn_down || delta_y == 0.0 {
			return;
		}
		self.camera.cancel_flight();
		let factor = if delta_y > 0.0 {
			ZOOM_STEP
		} else {
			1.0 / ZOOM_STEP
		};
		self.camera.dolly(factor);
	}

	pub fn resize(&mut self) {
		if self.torn_down {
			return;
		}
		let (width, height) = self.host.viewport_size();
		self.camera.resize(width / height);
	}

	/// Releases listeners and scene resources. Returns `false` if the state
	/// was already torn down.
	pub fn teardown(&mut self) -> bool {
		if self.torn_down {
			return false;
		}
		self.torn_down = true;
		if self.attached {
			for kind in ListenerKind::ALL {
				self.host.remove_listener(kind);
			}
			self.attached = false;
		}
		let released = self.scene.dispose();
		info!("constellation torn down, {released} meshes released");
		true
	}
}
