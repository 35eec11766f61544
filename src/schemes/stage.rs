//! Stages: the scene/level contexts the play scheme flies through

use crate::scene::{Light, Mesh, NodeId, SceneGraph, Transform};
use glam::{Quat, Vec3};

/// A named scene context plus the node ids its host scheme animates
pub struct Stage {
    pub name: &'static str,
    pub scene: SceneGraph,
    /// Nodes spun by the play scheme's update step
    pub animated: Vec<NodeId>,
}

impl Stage {
    /// Names of all built-in stages, in menu order
    pub fn builtin_names() -> &'static [&'static str] {
        &["Courtyard", "Orrery", "Empty"]
    }

    /// Builds a built-in stage by name; unknown names produce the empty
    /// stage
    pub fn builtin(name: &str) -> Stage {
        match name {
            "Courtyard" => Self::courtyard(),
            "Orrery" => Self::orrery(),
            _ => Self::empty(),
        }
    }

    /// No geometry, no lights; renders as a cleared frame
    pub fn empty() -> Stage {
        Stage {
            name: "Empty",
            scene: SceneGraph::new(),
            animated: Vec::new(),
        }
    }

    /// Floor plane with a ring of pillars around a spinning centerpiece
    pub fn courtyard() -> Stage {
        let mut scene = SceneGraph::new();
        scene.add_object("floor", &Mesh::plane(24.0), Transform::default());

        let pillar = Mesh::cube(1.0);
        for i in 0..8 {
            let angle = std::f32::consts::TAU * i as f32 / 8.0;
            let position = Vec3::new(angle.cos() * 8.0, 1.0, angle.sin() * 8.0);
            scene.add_object(
                format!("pillar {i}"),
                &pillar,
                Transform {
                    position,
                    rotation: Quat::from_rotation_y(-angle),
                    scale: Vec3::new(1.0, 2.0, 1.0),
                },
            );
        }

        let center = scene.add_object(
            "centerpiece",
            &Mesh::tetrahedron(2.0),
            Transform::at(Vec3::new(0.0, 2.0, 0.0)),
        );

        scene.add_light(Light::white(Vec3::new(6.0, 8.0, 4.0), 0.8));
        scene.add_light(Light::new(
            Vec3::new(-5.0, 3.0, -6.0),
            0.5,
            Vec3::new(1.0, 0.7, 0.4),
        ));

        Stage {
            name: "Courtyard",
            scene,
            animated: vec![center],
        }
    }

    /// Central sphere with two child spheres hanging off parent links,
    /// exercising transform chains
    pub fn orrery() -> Stage {
        let mut scene = SceneGraph::new();
        let sun = scene.add_object(
            "sun",
            &Mesh::uv_sphere(1.5, 12, 18),
            Transform::at(Vec3::new(0.0, 3.0, 0.0)),
        );
        let planet = scene.add_child_object(
            "planet",
            &Mesh::uv_sphere(0.6, 8, 12),
            Transform::at(Vec3::new(5.0, 0.0, 0.0)),
            sun,
        );
        let moon = scene.add_child_object(
            "moon",
            &Mesh::uv_sphere(0.25, 6, 8),
            Transform::at(Vec3::new(1.5, 0.0, 0.0)),
            planet,
        );

        scene.add_light(Light::white(Vec3::new(0.0, 10.0, 2.0), 1.0));

        Stage {
            name: "Orrery",
            scene,
            // spinning the parents swings the children around them
            animated: vec![sun, planet, moon],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_stages_are_valid() {
        for name in Stage::builtin_names() {
            let stage = Stage::builtin(name);
            stage.scene.validate().unwrap();
            assert_eq!(stage.name, *name);
        }
    }

    #[test]
    fn test_animated_nodes_exist() {
        for name in Stage::builtin_names() {
            let stage = Stage::builtin(name);
            for &id in &stage.animated {
                assert!(stage.scene.node(id).is_some());
            }
        }
    }

    #[test]
    fn test_unknown_name_falls_back_to_empty() {
        let stage = Stage::builtin("does-not-exist");
        assert!(stage.scene.is_empty());
    }

    #[test]
    fn test_orrery_builds_a_parent_chain() {
        let stage = Stage::orrery();
        let moon = stage.scene.node(2).unwrap();
        let planet = stage.scene.node(moon.parent.unwrap()).unwrap();
        assert_eq!(planet.parent, Some(0));
    }
}
