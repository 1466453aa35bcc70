//! Data shared by every state of one interactive session

use crate::channel::FrameChannel;
use crate::console::CommandSource;
use crate::error::Result;
use crate::sync_cell::MarkerSnapshot;
use crate::types::Aoi;

/// AOIs committed during the session, in commit order. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct AoiRegistry {
    aois: Vec<Aoi>,
}

impl AoiRegistry {
    /// Store `aoi`, returning the earlier AOI of the same name if it was replaced
    pub fn commit(&mut self, aoi: Aoi) -> Option<Aoi> {
        match self.aois.iter_mut().find(|a| a.name == aoi.name) {
            Some(existing) => Some(std::mem::replace(existing, aoi)),
            None => {
                self.aois.push(aoi);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Aoi> {
        self.aois.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aoi> {
        self.aois.iter()
    }

    pub fn len(&self) -> usize {
        self.aois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aois.is_empty()
    }

    pub fn into_vec(self) -> Vec<Aoi> {
        self.aois
    }
}

pub struct Session {
    markers: MarkerSnapshot,
    aois: AoiRegistry,
    input: Box<dyn CommandSource>,
    output: FrameChannel,
    stop_requested: bool,
    step_requested: bool,
}

impl Session {
    pub fn new(markers: MarkerSnapshot, input: Box<dyn CommandSource>, output: FrameChannel) -> Self {
        Self {
            markers,
            aois: AoiRegistry::default(),
            input,
            output,
            stop_requested: false,
            step_requested: false,
        }
    }

    /// Latest marker batch published by the pipeline
    pub fn markers(&self) -> &MarkerSnapshot {
        &self.markers
    }

    pub fn aois(&self) -> &AoiRegistry {
        &self.aois
    }

    pub fn aois_mut(&mut self) -> &mut AoiRegistry {
        &mut self.aois
    }

    pub fn input(&mut self) -> &mut dyn CommandSource {
        self.input.as_mut()
    }

    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stop_requested
    }

    /// Advance one frame on the next tick even though playback is paused
    pub fn request_step(&mut self) {
        self.step_requested = true;
    }

    pub fn take_step_request(&mut self) -> bool {
        std::mem::take(&mut self.step_requested)
    }

    /// Wake a consumer blocked on the output channel. Returns whether a
    /// sentinel was pushed.
    pub fn release_output(&self) -> Result<bool> {
        self.output.put_sentinel_if_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoigeom::Polygon;
    use std::collections::BTreeSet;

    fn aoi(name: &str, marker: u32) -> Aoi {
        Aoi {
            name: name.to_string(),
            selected_marker_ids: BTreeSet::from([marker]),
            boundary: Polygon::from_corners(&[[0, 0], [1, 0], [1, 1]]),
        }
    }

    #[test]
    fn test_commit_replaces_same_name() {
        let mut registry = AoiRegistry::default();
        assert!(registry.commit(aoi("desk", 1)).is_none());
        assert!(registry.commit(aoi("shelf", 2)).is_none());

        let replaced = registry.commit(aoi("desk", 3)).unwrap();
        assert_eq!(replaced.selected_marker_ids, BTreeSet::from([1]));
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("desk").unwrap().selected_marker_ids,
            BTreeSet::from([3])
        );
        let names: Vec<&str> = registry.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["desk", "shelf"]);
    }
}
