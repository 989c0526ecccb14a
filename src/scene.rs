//! Pure scene-model derivations for the rendering layer.
//!
//! The core never draws anything; it exposes the registry snapshot, and
//! renderers derive positioned objects from it with these functions. Both
//! derivations are referentially transparent: same registry in, same models
//! out.

use crate::registry::{Registry, WindowId};

pub type Position = [f32; 3];

/// One positioned object per registry entry, centered relative to the
/// calling window's own origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereModel {
    pub id: WindowId,
    pub center: Position,
    pub color: String,
}

/// A directed link between two spheres, colored by its source.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeModel {
    pub id: String,
    pub color: String,
    pub from: Position,
    pub to: Position,
}

/// Map each entry to a sphere centered relative to `own_id`'s origin.
///
/// The vertical axis is flipped so screen space (y grows downward) and
/// scene space (y grows upward) agree. Returns nothing when the caller's
/// own entry is absent; without an origin there is no frame to place peers
/// in.
pub fn sphere_models(registry: &Registry, own_id: &WindowId) -> Vec<SphereModel> {
    let Some(own) = registry.get(own_id) else {
        return Vec::new();
    };

    registry
        .iter()
        .map(|(id, entry)| {
            let cx = -(own.x as f32) + entry.x as f32 + entry.width as f32 / 2.0;
            let cy = own.y as f32 - entry.y as f32 + own.height as f32 - entry.height as f32
                + entry.height as f32 / 2.0;
            SphereModel {
                id: id.clone(),
                center: [cx, cy, 0.0],
                color: entry.color.clone(),
            }
        })
        .collect()
}

/// All-to-all directed links between distinct spheres.
pub fn bridges(spheres: &[SphereModel]) -> Vec<BridgeModel> {
    let mut bridges = Vec::new();
    for (i, from) in spheres.iter().enumerate() {
        for (j, to) in spheres.iter().enumerate() {
            if i != j {
                bridges.push(BridgeModel {
                    id: format!("{}-{}", from.id, to.id),
                    color: from.color.clone(),
                    from: from.center,
                    to: to.center,
                });
            }
        }
    }
    bridges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WindowRect;
    use crate::registry::WindowEntry;

    fn registry_of(entries: &[(&str, WindowRect)]) -> Registry {
        let mut registry = Registry::new();
        for (name, rect) in entries {
            registry.insert(WindowId::from(*name), WindowEntry::new(*rect, "red"));
        }
        registry
    }

    #[test]
    fn own_sphere_is_centered_in_own_viewport() {
        let registry = registry_of(&[("me", WindowRect::new(100, 200, 400, 300))]);
        let spheres = sphere_models(&registry, &WindowId::from("me"));
        assert_eq!(spheres.len(), 1);
        // cx = -100 + 100 + 200, cy = 200 - 200 + 300 - 300 + 150.
        assert_eq!(spheres[0].center, [200.0, 150.0, 0.0]);
    }

    #[test]
    fn peer_offset_is_relative_and_vertically_flipped() {
        let registry = registry_of(&[
            ("me", WindowRect::new(0, 0, 400, 300)),
            // Same size, 50 right of us and 40 below us on screen.
            ("peer", WindowRect::new(50, 40, 400, 300)),
        ]);
        let spheres = sphere_models(&registry, &WindowId::from("me"));
        let me = spheres
            .iter()
            .find(|s| s.id == WindowId::from("me"))
            .unwrap();
        let peer = spheres
            .iter()
            .find(|s| s.id == WindowId::from("peer"))
            .unwrap();

        assert_eq!(peer.center[0] - me.center[0], 50.0);
        // Screen-down becomes scene-down: the peer sits lower in the scene.
        assert_eq!(peer.center[1] - me.center[1], -40.0);
    }

    #[test]
    fn missing_own_entry_yields_no_models() {
        let registry = registry_of(&[("other", WindowRect::new(0, 0, 100, 100))]);
        assert!(sphere_models(&registry, &WindowId::from("me")).is_empty());
    }

    #[test]
    fn bridges_are_all_to_all_directed() {
        let registry = registry_of(&[
            ("a", WindowRect::new(0, 0, 100, 100)),
            ("b", WindowRect::new(10, 0, 100, 100)),
            ("c", WindowRect::new(20, 0, 100, 100)),
        ]);
        let spheres = sphere_models(&registry, &WindowId::from("a"));
        let bridges = bridges(&spheres);

        // n * (n - 1) directed pairs, none reflexive.
        assert_eq!(bridges.len(), 6);
        assert!(bridges.iter().all(|bridge| bridge.from != bridge.to));
    }

    #[test]
    fn bridge_takes_source_color() {
        let mut registry = Registry::new();
        registry.insert(
            WindowId::from("a"),
            WindowEntry::new(WindowRect::new(0, 0, 10, 10), "red"),
        );
        registry.insert(
            WindowId::from("b"),
            WindowEntry::new(WindowRect::new(50, 0, 10, 10), "lime"),
        );
        let spheres = sphere_models(&registry, &WindowId::from("a"));
        let bridges = bridges(&spheres);

        for bridge in &bridges {
            let source = bridge.id.split('-').next().unwrap();
            let expected = if source == "a" { "red" } else { "lime" };
            assert_eq!(bridge.color, expected);
        }
    }

    #[test]
    fn single_sphere_has_no_bridges() {
        let registry = registry_of(&[("a", WindowRect::new(0, 0, 100, 100))]);
        let spheres = sphere_models(&registry, &WindowId::from("a"));
        assert!(bridges(&spheres).is_empty());
    }
}
