//! Board-level routing: track segments, track arcs and vias.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::kiid::Kiid;
use crate::layers::PcbLayerId;
use crate::units::Biu;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub id: Kiid,
    pub start: Point,
    pub end: Point,
    pub width: Biu,
    pub layer: PcbLayerId,
    pub net: i32,
    pub locked: bool,
}

impl TrackSegment {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackArc {
    pub id: Kiid,
    pub start: Point,
    pub mid: Point,
    pub end: Point,
    pub width: Biu,
    pub layer: PcbLayerId,
    pub net: i32,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViaType {
    Through,
    BlindBuried,
    Micro,
}

impl ViaType {
    /// Legacy on-disk code: 3 through, 2 blind/buried, 1 micro.
    pub fn from_legacy(code: i64) -> ViaType {
        match code {
            1 => ViaType::Micro,
            2 => ViaType::BlindBuried,
            _ => ViaType::Through,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via {
    pub id: Kiid,
    pub position: Point,
    pub diameter: Biu,
    pub drill: Option<Biu>, // None = net class default
    pub top: PcbLayerId,
    pub bottom: PcbLayerId,
    pub via_type: ViaType,
    pub net: i32,
    pub locked: bool,
    pub free: bool,
    pub remove_unused_layers: bool,
    pub keep_end_layers: bool,
}

impl Via {
    pub fn set_layer_pair(&mut self, top: PcbLayerId, bottom: PcbLayerId) {
        // top is always the layer closer to the front
        if top.index() <= bottom.index() {
            self.top = top;
            self.bottom = bottom;
        } else {
            self.top = bottom;
            self.bottom = top;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Track {
    Segment(TrackSegment),
    Arc(TrackArc),
    Via(Via),
}

impl Track {
    pub fn id(&self) -> Kiid {
        match self {
            Track::Segment(t) => t.id,
            Track::Arc(a) => a.id,
            Track::Via(v) => v.id,
        }
    }

    pub fn net(&self) -> i32 {
        match self {
            Track::Segment(t) => t.net,
            Track::Arc(a) => a.net,
            Track::Via(v) => v.net,
        }
    }

    pub fn set_net(&mut self, net: i32) {
        match self {
            Track::Segment(t) => t.net = net,
            Track::Arc(a) => a.net = net,
            Track::Via(v) => v.net = net,
        }
    }

    pub fn is_via(&self) -> bool {
        matches!(self, Track::Via(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_via_type_from_legacy() {
        assert_eq!(ViaType::from_legacy(3), ViaType::Through);
        assert_eq!(ViaType::from_legacy(2), ViaType::BlindBuried);
        assert_eq!(ViaType::from_legacy(1), ViaType::Micro);
        assert_eq!(ViaType::from_legacy(0), ViaType::Through);
    }

    #[test]
    fn test_layer_pair_is_ordered() {
        let mut via = Via {
            id: Kiid::new(),
            position: Point::default(),
            diameter: 800_000,
            drill: None,
            top: PcbLayerId::F_CU,
            bottom: PcbLayerId::B_CU,
            via_type: ViaType::BlindBuried,
            net: 0,
            locked: false,
            free: false,
            remove_unused_layers: false,
            keep_end_layers: false,
        };
        via.set_layer_pair(PcbLayerId::B_CU, PcbLayerId::inner(1).unwrap());
        assert_eq!(via.top, PcbLayerId::inner(1).unwrap());
        assert_eq!(via.bottom, PcbLayerId::B_CU);
    }

    #[test]
    fn test_segment_length() {
        let seg = TrackSegment {
            id: Kiid::new(),
            start: Point::new(0, 0),
            end: Point::new(3_000_000, 4_000_000),
            width: 250_000,
            layer: PcbLayerId::F_CU,
            net: 1,
            locked: false,
        };
        assert_eq!(seg.length(), 5_000_000.0);
    }
}
