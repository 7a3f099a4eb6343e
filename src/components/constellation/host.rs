//! The boundary between the engine and whatever hosts it.
//!
//! In the browser this is a canvas element plus `window`; in tests it is a
//! recorder. The engine only registers listeners, sets the cursor and asks for
//! the viewport size through this trait.

use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
	PointerDown,
	PointerMove,
	PointerUp,
	PointerLeave,
	Resize,
}

impl ListenerKind {
	pub const ALL: [ListenerKind; 5] = [
		ListenerKind::PointerDown,
		ListenerKind::PointerMove,
		ListenerKind::PointerUp,
		ListenerKind::PointerLeave,
		ListenerKind::Resize,
	];

	pub fn event_name(self) -> &'static str {
		match self {
			ListenerKind::PointerDown => "pointerdown",
			ListenerKind::PointerMove => "pointermove",
			ListenerKind::PointerUp => "pointerup",
			ListenerKind::PointerLeave => "pointerleave",
			ListenerKind::Resize => "resize",
		}
	}

	/// `resize` is a window event; the rest land on the canvas.
	pub fn targets_window(self) -> bool {
		matches!(self, ListenerKind::Resize)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorAffordance {
	#[default]
	Default,
	Pointer,
	Grab,
	Grabbing,
}

impl CursorAffordance {
	pub fn as_css(self) -> &'static str {
		match self {
			CursorAffordance::Default => "default",
			CursorAffordance::Pointer => "pointer",
			CursorAffordance::Grab => "grab",
			CursorAffordance::Grabbing => "grabbing",
		}
	}
}

/// A pointer sample in canvas pixels, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
	pub x: f32,
	pub y: f32,
	pub timestamp: f64,
}

impl PointerInput {
	pub fn new(x: f32, y: f32) -> Self {
		Self { x, y, timestamp: 0.0 }
	}
}

pub trait HostSurface {
	fn add_listener(&mut self, kind: ListenerKind);
	fn remove_listener(&mut self, kind: ListenerKind);
	fn set_cursor(&mut self, cursor: CursorAffordance);
	/// Width and height in CSS pixels.
	fn viewport_size(&self) -> (f32, f32);
}

pub trait Navigator {
	fn navigate(&mut self, route: &str);
}

impl<F: FnMut(&str)> Navigator for F {
	fn navigate(&mut self, route: &str) {
		self(route)
	}
}

/// Canvas pixels to normalized device coordinates, y up.
pub fn to_ndc(input: &PointerInput, viewport: (f32, f32)) -> Vec2 {
	let (width, height) = viewport;
	if width <= 0.0 || height <= 0.0 {
		return Vec2::ZERO;
	}
	Vec2::new(
		input.x / width * 2.0 - 1.0,
		-(input.y / height) * 2.0 + 1.0,
	)
}

#[cfg(test)]
pub(crate) mod testing {
	use std::collections::HashSet;

	use super::*;

	/// Host double that records what the engine asked of it.
	pub struct RecordingHost {
		pub listeners: HashSet<ListenerKind>,
		pub removed: Vec<ListenerKind>,
		pub cursors: Vec<CursorAffordance>,
		pub size: (f32, f32),
	}

	impl RecordingHost {
		pub fn new(width: f32, height: f32) -> Self {
			Self {
				listeners: HashSet::new(),
				removed: Vec::new(),
				cursors: Vec::new(),
				size: (width, height),
			}
		}

		pub fn cursor(&self) -> CursorAffordance {
			self.cursors.last().copied().unwrap_or_default()
		}
	}

	impl HostSurface for RecordingHost {
		fn add_listener(&mut self, kind: ListenerKind) {
			self.listeners.insert(kind);
		}

		fn remove_listener(&mut self, kind: ListenerKind) {
			if self.listeners.remove(&kind) {
				self.removed.push(kind);
			}
		}

		fn set_cursor(&mut self, cursor: CursorAffordance) {
			self.cursors.push(cursor);
		}

		fn viewport_size(&self) -> (f32, f32) {
			self.size
		}
	}

	#[derive(Default)]
	pub struct RecordingNavigator {
		pub routes: Vec<String>,
	}

	impl Navigator for RecordingNavigator {
		fn navigate(&mut self, route: &str) {
			self.routes.push(route.to_owned());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ndc_corners_and_center() {
		let viewport = (800.0, 600.0);
		assert_eq!(to_ndc(&PointerInput::new(400.0, 300.0), viewport), Vec2::ZERO);
		assert_eq!(
			to_ndc(&PointerInput::new(0.0, 0.0), viewport),
			Vec2::new(-1.0, 1.0)
		);
		assert_eq!(
			to_ndc(&PointerInput::new(800.0, 600.0), viewport),
			Vec2::new(1.0, -1.0)
		);
		assert_eq!(to_ndc(&PointerInput::new(5.0, 5.0), (0.0, 0.0)), Vec2::ZERO);
	}

	#[test]
	fn closures_navigate() {
		let mut seen = Vec::new();
		let mut navigator = |route: &str| seen.push(route.to_owned());
		navigator.navigate("/about");
		assert_eq!(seen, ["/about"]);
	}
}
