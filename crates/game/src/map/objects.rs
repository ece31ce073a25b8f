use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapObjectKind {
    Ground,
    StaticBox,
}

#[derive(Debug, Clone)]
pub struct MapObject {
    pub kind: MapObjectKind,
    pub position: Vec3,
    pub half_extents: Vec3,
}

impl MapObject {
    pub fn ground(position: Vec3, half_size: f32) -> Self {
        Self {
            kind: MapObjectKind::Ground,
            position,
            half_extents: Vec3::new(half_size, 0.1, half_size),
        }
    }

    pub fn static_box(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            kind: MapObjectKind::StaticBox,
            position,
            half_extents,
        }
    }
}

/// Named position in a map, such as a spawn point.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub position: Vec3,
}

impl Marker {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}
