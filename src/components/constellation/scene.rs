//! Render-facing scene objects and ray picking.
//!
//! The scene knows nothing about physics. Meshes are spheres with a transform,
//! a picking layer and a bag of numeric uniforms; picks resolve to their owner
//! through a side table filled at spawn time.

use std::collections::HashMap;

use glam::Vec3;

use super::types::Rgb;

pub const U_TIME: &str = "uTime";
pub const U_ANIMATION_SPEED: &str = "uAnimationSpeed";
pub const U_WAVE_STRENGTH: &str = "uWaveStrength";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u32);

/// Partition used to restrict ray tests to one category of object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
	Portal,
	Constellation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshKind {
	Sun,
	Planet,
	Portal,
}

/// What a picked mesh belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickOwner {
	Node(String),
	Portal,
}

#[derive(Clone, Debug, Default)]
pub struct Uniforms(HashMap<&'static str, f32>);

impl Uniforms {
	pub fn set(&mut self, name: &'static str, value: f32) {
		self.0.insert(name, value);
	}

	pub fn get(&self, name: &str) -> Option<f32> {
		self.0.get(name).copied()
	}
}

#[derive(Clone, Debug)]
pub struct Mesh {
	pub id: MeshId,
	pub kind: MeshKind,
	pub layer: Layer,
	pub position: Vec3,
	pub radius: f32,
	pub color: Rgb,
	pub uniforms: Uniforms,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
}

impl Ray {
	pub fn new(origin: Vec3, direction: Vec3) -> Self {
		Self {
			origin,
			direction: direction.normalize_or_zero(),
		}
	}

	pub fn at(&self, t: f32) -> Vec3 {
		self.origin + self.direction * t
	}

	pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
		let denominator = plane.normal.dot(self.direction);
		if denominator.abs() < 1e-6 {
			// Parallel; only a hit if the origin already lies on the plane.
			return (plane.distance_to(self.origin).abs() < 1e-6).then_some(self.origin);
		}
		let t = -(self.origin.dot(plane.normal) + plane.constant) / denominator;
		(t >= 0.0).then(|| self.at(t))
	}

	/// Distance along the ray to the first surface hit of a sphere.
	pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
		let to_center = center - self.origin;
		let along = to_center.dot(self.direction);
		let closest_sq = to_center.length_squared() - along * along;
		let radius_sq = radius * radius;
		if closest_sq > radius_sq {
			return None;
		}
		let half_chord = (radius_sq - closest_sq).sqrt();
		let near = along - half_chord;
		let far = along + half_chord;
		if far < 0.0 {
			None
		} else if near < 0.0 {
			Some(far)
		} else {
			Some(near)
		}
	}
}

/// Plane in Hessian normal form: `normal · p + constant = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
	pub normal: Vec3,
	pub constant: f32,
}

impl Plane {
	pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
		let normal = normal.normalize_or_zero();
		Self {
			normal,
			constant: -point.dot(normal),
		}
	}

	pub fn distance_to(&self, point: Vec3) -> f32 {
		self.normal.dot(point) + self.constant
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	pub min: Vec3,
	pub max: Vec3,
}

impl Aabb {
	pub fn around(center: Vec3, radius: f32) -> Self {
		let extent = Vec3::splat(radius.max(0.0));
		Self {
			min: center - extent,
			max: center + extent,
		}
	}

	pub fn union(self, other: Self) -> Self {
		Self {
			min: self.min.min(other.min),
			max: self.max.max(other.max),
		}
	}

	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}

	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
	pub mesh: MeshId,
	pub distance: f32,
}

#[derive(Default)]
pub struct Scene {
	meshes: Vec<Mesh>,
	index_by_id: HashMap<MeshId, usize>,
	owners: HashMap<MeshId, PickOwner>,
	next_id: u32,
	disposed: bool,
}

impl Scene {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn spawn(
		&mut self,
		kind: MeshKind,
		layer: Layer,
		position: Vec3,
		radius: f32,
		color: Rgb,
		owner: PickOwner,
	) -> MeshId {
		let id = MeshId(self.next_id);
		self.next_id += 1;
		self.index_by_id.insert(id, self.meshes.len());
		self.owners.insert(id, owner);
		self.meshes.push(Mesh {
			id,
			kind,
			layer,
			position,
			radius,
			color,
			uniforms: Uniforms::default(),
		});
		id
	}

	pub fn despawn(&mut self, id: MeshId) -> bool {
		let Some(index) = self.index_by_id.remove(&id) else {
			return false;
		};
		self.owners.remove(&id);
		self.meshes.remove(index);
		for (slot, mesh) in self.meshes.iter().enumerate().skip(index) {
			self.index_by_id.insert(mesh.id, slot);
		}
		true
	}

	#[cfg(test)]
	pub fn meshes(&self) -> &[Mesh] {
		&self.meshes
	}

	pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
		let index = *self.index_by_id.get(&id)?;
		self.meshes.get(index)
	}

	pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
		let index = *self.index_by_id.get(&id)?;
		self.meshes.get_mut(index)
	}

	pub fn set_position(&mut self, id: MeshId, position: Vec3) {
		if let Some(mesh) = self.mesh_mut(id) {
			mesh.position = position;
		}
	}

	pub fn owner(&self, id: MeshId) -> Option<&PickOwner> {
		self.owners.get(&id)
	}

	/// All hits on `layer`, nearest first.
	pub fn raycast(&self, ray: &Ray, layer: Layer) -> Vec<Hit> {
		let mut hits = self
			.meshes
			.iter()
			.filter(|mesh| mesh.layer == layer)
			.filter_map(|mesh| {
				ray.intersect_sphere(mesh.position, mesh.radius)
					.map(|distance| Hit {
						mesh: mesh.id,
						distance,
					})
			})
			.collect::<Vec<_>>();
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits
	}

	pub fn bounds(&self, ids: impl IntoIterator<Item = MeshId>) -> Option<Aabb> {
		ids.into_iter()
			.filter_map(|id| self.mesh(id))
			.map(|mesh| Aabb::around(mesh.position, mesh.radius))
			.reduce(Aabb::union)
	}

	/// Releases every mesh. Returns how many were released; calling it again
	/// releases nothing.
	pub fn dispose(&mut self) -> usize {
		if self.disposed {
			return 0;
		}
		self.disposed = true;
		let released = self.meshes.len();
		self.meshes.clear();
		self.index_by_id.clear();
		self.owners.clear();
		released
	}

	#[cfg(test)]
	pub fn is_disposed(&self) -> bool {
		self.disposed
	}
}
