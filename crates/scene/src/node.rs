use serde::{Deserialize, Serialize};
use stagecraft_common::{Color, GeometryId, MaterialId, NodeId, Transform};

/// Light sources. Point lights take their position from the node transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Point { color: Color, intensity: f32 },
    Ambient { color: Color, intensity: f32 },
}

impl Light {
    pub fn color(&self) -> Color {
        match *self {
            Self::Point { color, .. } | Self::Ambient { color, .. } => color,
        }
    }

    /// Color premultiplied by intensity.
    pub fn radiance(&self) -> Color {
        match *self {
            Self::Point { color, intensity } | Self::Ambient { color, intensity } => {
                color.scaled(intensity)
            }
        }
    }
}

/// What a node contributes to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
    },
    Light(Light),
    /// Debug visual. With `follow` set, the helper is drawn at the followed
    /// node's position instead of its own.
    Helper {
        geometry: GeometryId,
        material: MaterialId,
        follow: Option<NodeId>,
    },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mesh { .. } => "mesh",
            Self::Light(Light::Point { .. }) => "point-light",
            Self::Light(Light::Ambient { .. }) => "ambient-light",
            Self::Helper { .. } => "helper",
        }
    }
}

/// A transform plus what sits at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub transform: Transform,
    pub kind: NodeKind,
}
