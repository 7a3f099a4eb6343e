use std::f64::consts::PI;

use glam::Vec3;
use web_sys::CanvasRenderingContext2d;

use super::backdrop::Backdrop;
use super::camera::Camera;
use super::host::{HostSurface, Navigator};
use super::scene::{Scene, U_ANIMATION_SPEED, U_TIME};
use super::state::ConstellationState;
use super::tether::{Tether, TetherState};
use super::types::{NodeKind, Rgb};
use super::universe::Universe;

const BACKGROUND: &str = "#000005";
/// Every nth tether point is drawn.
const TETHER_STRIDE: usize = 3;

fn rgba(color: Rgb, alpha: f32) -> String {
	let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
	format!(
		"rgba({}, {}, {}, {:.3})",
		channel(color[0]),
		channel(color[1]),
		channel(color[2]),
		alpha.clamp(0.0, 1.0)
	)
}

/// A world point on screen, with its pixels-per-unit scale and depth.
struct Projected {
	x: f64,
	y: f64,
	scale: f64,
	depth: f32,
}

struct View<'a> {
	camera: &'a Camera,
	width: f64,
	height: f64,
}

impl View<'_> {
	fn project(&self, point: Vec3) -> Option<Projected> {
		let ndc = self.camera.project(point)?;
		if ndc.z > 1.0 {
			return None;
		}
		let scale = self.camera.pixels_per_unit(point, self.height as f32)?;
		Some(Projected {
			x: (ndc.x as f64 + 1.0) * 0.5 * self.width,
			y: (1.0 - ndc.y as f64) * 0.5 * self.height,
			scale: scale as f64,
			depth: self.camera.depth(point),
		})
	}
}

pub fn render<H: HostSurface, N: Navigator>(
	state: &ConstellationState<H, N>,
	ctx: &CanvasRenderingContext2d,
) {
	let (width, height) = state.viewport_size();
	let view = View {
		camera: &state.camera,
		width: width as f64,
		height: height as f64,
	};

	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, view.width, view.height);

	draw_stars(&view, &state.backdrop, ctx);
	draw_galaxy(&view, &state.backdrop, ctx);
	draw_portal(&view, &state.backdrop, &state.scene, ctx);
	if let Some(universe) = &state.universe {
		for tether in universe.tethers() {
			draw_tether(&view, tether, ctx);
		}
		draw_bodies(&view, universe, &state.scene, ctx);
	}
	draw_shooting_stars(&view, &state.backdrop, ctx);
	ctx.set_global_alpha(1.0);
}

fn draw_stars(view: &View, backdrop: &Backdrop, ctx: &CanvasRenderingContext2d) {
	let time = backdrop.time();
	for star in backdrop.stars() {
		let Some(p) = view.project(star.position) else {
			continue;
		};
		let twinkle = star.twinkle(time);
		// Point size shrinks with depth, as a sized point sprite would.
		let size = (star.size * twinkle * 300.0 / p.depth).max(0.25) as f64;
		ctx.set_fill_style_str(&rgba(star.color, 0.4 + 0.6 * twinkle));
		ctx.fill_rect(p.x - size * 0.5, p.y - size * 0.5, size, size);
	}
}

fn draw_galaxy(view: &View, backdrop: &Backdrop, ctx: &CanvasRenderingContext2d) {
	let matrix = backdrop.galaxy_matrix();
	for point in backdrop.galaxy() {
		let local = point.position + Vec3::Y * backdrop.wave_offset(point);
		let Some(p) = view.project(matrix.transform_point3(local)) else {
			continue;
		};
		let size = (0.12 * p.scale).clamp(0.5, 3.0);
		ctx.set_fill_style_str(&rgba(point.color, 0.8));
		ctx.fill_rect(p.x - size * 0.5, p.y - size * 0.5, size, size);
	}
}

fn draw_portal(view: &View, backdrop: &Backdrop, scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let Some(mesh) = scene.mesh(backdrop.portal()) else {
		return;
	};
	let Some(p) = view.project(mesh.position) else {
		return;
	};
	let radius = mesh.radius as f64 * p.scale;
	let wave = backdrop.wave_strength();

	let Ok(halo) = ctx.create_radial_gradient(p.x, p.y, radius, p.x, p.y, radius * (1.6 + wave as f64))
	else {
		return;
	};
	let _ = halo.add_color_stop(0.0, &rgba([0.8, 0.7, 1.0], 0.25 + 0.5 * wave));
	let _ = halo.add_color_stop(1.0, "rgba(0, 0, 0, 0)");
	ctx.begin_path();
	let _ = ctx.arc(p.x, p.y, radius * (1.6 + wave as f64), 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&halo);
	ctx.fill();

	ctx.begin_path();
	let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("#000000");
	ctx.fill();
}

fn draw_tether(view: &View, tether: &Tether, ctx: &CanvasRenderingContext2d) {
	let points = tether.points();
	let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
		return;
	};
	let axis = (last - first).try_normalize().unwrap_or(Vec3::X);
	let side = axis.cross(Vec3::Z).try_normalize().unwrap_or(Vec3::Y);
	let lift = axis.cross(side);

	let phase = tether.time() * tether.helix_speed() * std::f32::consts::TAU;
	let radius = tether.helix_radius();
	let brightness = tether.brightness();
	let span = (points.len() - 1).max(1) as f32;
	let pulse = tether.pulse_progress();
	let weight = if tether.state() == TetherState::Dragged {
		1.5
	} else {
		1.0
	};

	ctx.set_fill_style_str(&rgba(tether.color, brightness));
	for (index, point) in points.iter().enumerate().step_by(TETHER_STRIDE) {
		let angle = phase + index as f32 * 0.25;
		let offset = side * angle.sin() * radius + lift * angle.cos() * radius;
		let Some(p) = view.project(*point + offset) else {
			continue;
		};
		let size = (0.15 * p.scale).clamp(0.6, 2.5) * weight;
		ctx.fill_rect(p.x - size * 0.5, p.y - size * 0.5, size, size);
	}

	if (0.0..=1.0).contains(&pulse) {
		let index = (pulse * span).round() as usize;
		let Some(p) = points.get(index).and_then(|point| view.project(*point)) else {
			return;
		};
		let size = (0.6 * p.scale).clamp(2.0, 10.0);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, size, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&rgba([1.0, 1.0, 1.0], 0.9));
		ctx.fill();
	}
}

fn draw_bodies(view: &View, universe: &Universe, scene: &Scene, ctx: &CanvasRenderingContext2d) {
	let mut bodies = universe
		.nodes()
		.iter()
		.filter_map(|node| {
			let mesh = scene.mesh(node.mesh)?;
			let p = view.project(mesh.position)?;
			Some((node, mesh, p))
		})
		.collect::<Vec<_>>();
	// Far to near.
	bodies.sort_by(|a, b| b.2.depth.total_cmp(&a.2.depth));

	for (node, mesh, p) in bodies {
		let radius = mesh.radius as f64 * p.scale;
		match &node.kind {
			NodeKind::Sun(spec) => {
				let time = mesh.uniforms.get(U_TIME).unwrap_or(0.0);
				let speed = mesh.uniforms.get(U_ANIMATION_SPEED).unwrap_or(1.0);
				let flicker = 1.0 + 0.06 * (time * speed * 2.0).sin() as f64;
				let corona = radius * 2.2 * flicker;
				let Ok(glow) = ctx.create_radial_gradient(p.x, p.y, radius * 0.2, p.x, p.y, corona)
				else {
					continue;
				};
				let _ = glow.add_color_stop(0.0, &rgba([1.0, 1.0, 1.0], 1.0));
				let _ = glow.add_color_stop(0.35, &rgba(spec.core, 0.95));
				let _ = glow.add_color_stop(0.6, &rgba(spec.corona, 0.35));
				let _ = glow.add_color_stop(1.0, "rgba(0, 0, 0, 0)");
				ctx.begin_path();
				let _ = ctx.arc(p.x, p.y, corona, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&glow);
				ctx.fill();

				ctx.set_fill_style_str(&rgba(spec.corona, 0.9));
				ctx.set_font("12px sans-serif");
				ctx.set_text_align("center");
				let _ = ctx.fill_text(spec.id, p.x, p.y + corona + 14.0);
			}
			NodeKind::Planet(record) => {
				ctx.begin_path();
				let _ = ctx.arc(p.x, p.y, radius.max(1.5), 0.0, 2.0 * PI);
				ctx.set_fill_style_str(&rgba(mesh.color, 1.0));
				ctx.fill();

				ctx.set_fill_style_str("rgba(255, 255, 255, 0.75)");
				ctx.set_font("10px sans-serif");
				ctx.set_text_align("left");
				let _ = ctx.fill_text(record.label(), p.x + radius + 4.0, p.y + 3.0);
			}
		}
	}
}

fn draw_shooting_stars(view: &View, backdrop: &Backdrop, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_width(1.5);
	for star in backdrop.shooting_stars() {
		let tail = star.position - star.direction * 4.0;
		let (Some(head), Some(tail)) = (view.project(star.position), view.project(tail)) else {
			continue;
		};
		ctx.set_stroke_style_str(&rgba([1.0, 1.0, 1.0], (star.life / 3.0).min(1.0)));
		ctx.begin_path();
		ctx.move_to(tail.x, tail.y);
		ctx.line_to(head.x, head.y);
		ctx.stroke();
	}
}
