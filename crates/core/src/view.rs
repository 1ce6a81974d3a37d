//! View and filter state owned by the host UI and the interaction controller.

use crate::core_types::HazardType;
use crate::store::TimePeriod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Hazards and communities in two rows, map-like
    #[default]
    Spatial,
    /// Counter-rotating rings with proximity links (equity lens)
    Network,
}

impl Mode {
    /// Whether the mode needs a frame every tick regardless of play state.
    #[must_use]
    pub const fn animates_continuously(self) -> bool {
        matches!(self, Self::Network)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spatial => "spatial",
            Self::Network => "network",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spatial" | "map" => Ok(Self::Spatial),
            "network" | "equity" => Ok(Self::Network),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// A toggleable layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Hazard(HazardType),
    Communities,
    Connections,
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "communities" => Ok(Self::Communities),
            "connections" => Ok(Self::Connections),
            other => HazardType::from_name(other)
                .map(Self::Hazard)
                .ok_or_else(|| format!("unknown layer '{other}'")),
        }
    }
}

/// Visibility of the six layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct VisibleLayers {
    pub heat: bool,
    pub flood: bool,
    pub fire: bool,
    pub air: bool,
    pub communities: bool,
    pub connections: bool,
}

impl Default for VisibleLayers {
    fn default() -> Self {
        Self {
            heat: true,
            flood: true,
            fire: true,
            air: true,
            communities: true,
            connections: true,
        }
    }
}

impl VisibleLayers {
    #[must_use]
    pub const fn hazard(&self, hazard_type: HazardType) -> bool {
        match hazard_type {
            HazardType::Heat => self.heat,
            HazardType::Flood => self.flood,
            HazardType::Fire => self.fire,
            HazardType::Air => self.air,
        }
    }

    #[must_use]
    pub const fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Hazard(t) => self.hazard(t),
            Layer::Communities => self.communities,
            Layer::Connections => self.connections,
        }
    }

    pub fn set(&mut self, layer: Layer, visible: bool) {
        let slot = match layer {
            Layer::Hazard(HazardType::Heat) => &mut self.heat,
            Layer::Hazard(HazardType::Flood) => &mut self.flood,
            Layer::Hazard(HazardType::Fire) => &mut self.fire,
            Layer::Hazard(HazardType::Air) => &mut self.air,
            Layer::Communities => &mut self.communities,
            Layer::Connections => &mut self.connections,
        };
        *slot = visible;
    }
}

/// Discrete simulation speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationSpeed {
    #[serde(rename = "0.5")]
    Half,
    #[default]
    #[serde(rename = "1")]
    Normal,
    #[serde(rename = "2")]
    Double,
}

impl SimulationSpeed {
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Half => 0.5,
            Self::Normal => 1.0,
            Self::Double => 2.0,
        }
    }
}

impl FromStr for SimulationSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('x') {
            "0.5" | ".5" => Ok(Self::Half),
            "1" | "1.0" => Ok(Self::Normal),
            "2" | "2.0" => Ok(Self::Double),
            other => Err(format!("unsupported speed '{other}' (use 0.5, 1 or 2)")),
        }
    }
}

/// Selection as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    pub kind: crate::layout::NodeKind,
}

/// View/filter state.
///
/// Written only by the interaction controller and external UI controls, read by
/// every pipeline stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: Mode,
    pub visible_layers: VisibleLayers,
    pub time_period: TimePeriod,
    /// Keeps spatial-mode frames running; never pauses network mode
    pub is_playing: bool,
    pub simulation_speed: SimulationSpeed,
    pub selected: Option<Selection>,
}

impl ViewState {
    #[must_use]
    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.id.as_str())
    }
}
