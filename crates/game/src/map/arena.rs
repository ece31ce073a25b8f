use glam::Vec3;

use crate::physics::PhysicsWorld;

use super::{MapObject, MapObjectKind, Marker};

/// Static level geometry plus named markers.
#[derive(Debug, Clone, Default)]
pub struct ArenaMap {
    objects: Vec<MapObject>,
    markers: Vec<Marker>,
}

impl ArenaMap {
    const GROUND_SIZE: f32 = 30.0;
    const WALL_HEIGHT: f32 = 2.0;
    const WALL_THICKNESS: f32 = 0.5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, object: MapObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_marker(mut self, name: impl Into<String>, position: Vec3) -> Self {
        self.markers.push(Marker::new(name, position));
        self
    }

    /// Walled square arena with cover boxes and six spawn markers.
    pub fn testing_arena() -> Self {
        let mut map = Self::new().with_object(MapObject::ground(Vec3::ZERO, Self::GROUND_SIZE));

        let edge = Self::GROUND_SIZE;
        let h = Self::WALL_HEIGHT;
        let t = Self::WALL_THICKNESS;
        for (position, half_extents) in [
            (Vec3::new(0.0, h, edge), Vec3::new(edge, h, t)),
            (Vec3::new(0.0, h, -edge), Vec3::new(edge, h, t)),
            (Vec3::new(edge, h, 0.0), Vec3::new(t, h, edge)),
            (Vec3::new(-edge, h, 0.0), Vec3::new(t, h, edge)),
        ] {
            map.objects.push(MapObject::static_box(position, half_extents));
        }

        for position in [
            Vec3::new(6.0, 1.0, 0.0),
            Vec3::new(-6.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 8.0),
            Vec3::new(0.0, 1.0, -8.0),
        ] {
            map.objects
                .push(MapObject::static_box(position, Vec3::new(1.0, 1.0, 1.0)));
        }

        let spawns = [
            Vec3::new(-12.0, 0.0, -12.0),
            Vec3::new(12.0, 0.0, -12.0),
            Vec3::new(-12.0, 0.0, 12.0),
            Vec3::new(12.0, 0.0, 12.0),
            Vec3::new(0.0, 0.0, -20.0),
            Vec3::new(0.0, 0.0, 20.0),
        ];
        for (i, position) in spawns.into_iter().enumerate() {
            map.markers.push(Marker::new(format!("spawn_{i}"), position));
        }

        map
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == name)
    }

    /// Adds the static colliders to a physics world.
    pub fn build(&self, physics: &mut PhysicsWorld) {
        for object in &self.objects {
            match object.kind {
                MapObjectKind::Ground => {
                    physics.add_ground(object.position.y, object.half_extents.x);
                }
                MapObjectKind::StaticBox => {
                    physics.add_static_box(object.position, object.half_extents);
                }
            }
        }
    }
}
