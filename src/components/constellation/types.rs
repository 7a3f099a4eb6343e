use glam::Vec3;
use serde::Deserialize;

/// Linear RGB triple in `0.0..=1.0`.
pub type Rgb = [f32; 3];

/// A portfolio entry as it appears in `projects.json`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectRecord {
	pub id: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub categories: Vec<String>,
	#[serde(default)]
	pub size: Option<f32>,
}

impl ProjectRecord {
	pub fn new(id: impl Into<String>, categories: &[&str]) -> Self {
		Self {
			id: id.into(),
			title: None,
			categories: categories.iter().map(|c| (*c).to_owned()).collect(),
			size: None,
		}
	}

	pub fn label(&self) -> &str {
		self.title.as_deref().unwrap_or(&self.id)
	}
}

/// A skill category rendered as a sun.
#[derive(Clone, Debug, PartialEq)]
pub struct SunSpec {
	pub id: &'static str,
	/// Designer-chosen anchor; suns are pinned here for the whole session.
	pub anchor: Vec3,
	pub core: Rgb,
	pub corona: Rgb,
	/// Contribution of this category to a planet's colour.
	pub tint: Rgb,
}

pub static SUNS: [SunSpec; 3] = [
	SunSpec {
		id: "Design",
		anchor: Vec3::new(-20.0, 10.0, 0.0),
		core: [1.0, 0.255, 0.212],
		corona: [1.0, 0.522, 0.106],
		tint: [1.0, 0.0, 0.0],
	},
	SunSpec {
		id: "Development",
		anchor: Vec3::new(20.0, 10.0, 0.0),
		core: [0.0, 0.455, 0.851],
		corona: [0.498, 0.859, 1.0],
		tint: [0.0, 0.0, 1.0],
	},
	SunSpec {
		id: "Video Editing",
		anchor: Vec3::new(0.0, -20.0, 0.0),
		core: [0.180, 0.800, 0.251],
		corona: [0.686, 1.0, 0.620],
		tint: [0.0, 1.0, 0.0],
	},
];

pub fn sun_spec(id: &str) -> Option<&'static SunSpec> {
	SUNS.iter().find(|sun| sun.id == id)
}

/// Node kind with its kind-specific payload.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
	Sun(&'static SunSpec),
	Planet(ProjectRecord),
}

/// Average of the tints of every known category; a planet that spans all
/// three reads as near-white instead of a muddy grey.
pub fn planet_color(categories: &[String]) -> Rgb {
	let mut color = [0.0_f32; 3];
	let mut count = 0usize;
	for sun in categories.iter().filter_map(|c| sun_spec(c)) {
		for (channel, tint) in color.iter_mut().zip(sun.tint) {
			*channel += tint;
		}
		count += 1;
	}

	if count == SUNS.len() {
		return [0.9, 0.9, 0.9];
	}
	if count > 1 {
		for channel in &mut color {
			*channel /= count as f32;
		}
	}
	color
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn planet_color_averages_known_categories() {
		let color = planet_color(&["Design".into(), "Development".into()]);
		assert_eq!(color, [0.5, 0.0, 0.5]);
	}

	#[test]
	fn planet_color_ignores_unknown_and_whitens_full_set() {
		assert_eq!(planet_color(&["Cooking".into()]), [0.0, 0.0, 0.0]);
		let all = SUNS.iter().map(|s| s.id.to_owned()).collect::<Vec<_>>();
		assert_eq!(planet_color(&all), [0.9, 0.9, 0.9]);
	}

	#[test]
	fn record_decodes_without_optional_fields() {
		let record: ProjectRecord = serde_json::from_str(r#"{"id":"p1"}"#).unwrap();
		assert_eq!(record.id, "p1");
		assert!(record.categories.is_empty());
		assert_eq!(record.label(), "p1");
	}
}
