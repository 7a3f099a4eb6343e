//! Time-bound eased values, advanced once per frame.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Easing {
	#[default]
	OutQuad,
	OutCubic,
	InOutCubic,
	InOutQuart,
}

impl Easing {
	pub fn apply(self, t: f32) -> f32 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Easing::OutQuad => 1.0 - (1.0 - t).powi(2),
			Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
			Easing::InOutCubic => {
				if t < 0.5 {
					4.0 * t.powi(3)
				} else {
					1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
				}
			}
			Easing::InOutQuart => {
				if t < 0.5 {
					8.0 * t.powi(4)
				} else {
					1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
				}
			}
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tween {
	from: f32,
	to: f32,
	duration: f32,
	elapsed: f32,
	easing: Easing,
}

/// A scalar that eases toward a target over a fixed duration.
///
/// Starting a new animation replaces the one in flight and continues from the
/// current value, so rapid hover in/out never jumps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tweened {
	value: f32,
	tween: Option<Tween>,
}

impl Tweened {
	pub fn new(value: f32) -> Self {
		Self { value, tween: None }
	}

	pub fn get(&self) -> f32 {
		self.value
	}

	/// Where the value ends up once the current animation finishes.
	pub fn target(&self) -> f32 {
		self.tween.map_or(self.value, |tween| tween.to)
	}

	pub fn is_animating(&self) -> bool {
		self.tween.is_some()
	}

	pub fn set_immediate(&mut self, value: f32) {
		self.value = value;
		self.tween = None;
	}

	pub fn animate_to(&mut self, to: f32, duration: f32, easing: Easing) {
		self.animate_from_to(self.value, to, duration, easing);
	}

	pub fn animate_from_to(&mut self, from: f32, to: f32, duration: f32, easing: Easing) {
		if duration <= 0.0 {
			self.set_immediate(to);
			return;
		}
		self.value = from;
		self.tween = Some(Tween {
			from,
			to,
			duration,
			elapsed: 0.0,
			easing,
		});
	}

	pub fn advance(&mut self, dt: f32) {
		let Some(tween) = self.tween.as_mut() else {
			return;
		};
		tween.elapsed += dt.max(0.0);
		let progress = tween.elapsed / tween.duration;
		if progress >= 1.0 {
			self.value = tween.to;
			self.tween = None;
		} else {
			self.value = tween.from + (tween.to - tween.from) * tween.easing.apply(progress);
		}
	}
}
