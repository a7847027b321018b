use crate::scale::OrdinalScale;
use crate::types::PlacedPlant;

/// Hover payload for one plant: the name, the capacity with its
/// category color, and the city. The host surface decides how to
/// present it; the SVG renderer emits it as the circle's title.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub title: String,
    pub value_mw: f64,
    pub value_color: String,
    pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipState {
    Hidden,
}

/// Content for the currently hovered plant. Pure: no tooltip state
/// lives here, only the mapping from record to display payload.
pub fn on_enter(plant: &PlacedPlant, colors: &OrdinalScale) -> TooltipContent {
    TooltipContent {
        title: plant.record.name.clone(),
        value_mw: plant.record.value,
        value_color: colors.color_or_fallback(&plant.record.group).to_string(),
        city: plant.record.city.clone(),
    }
}

pub fn on_leave() -> TooltipState {
    TooltipState::Hidden
}

impl TooltipContent {
    /// Single-line rendering used for SVG title elements.
    pub fn to_text(&self) -> String {
        format!("{} {} MW {}", self.title, self.value_mw, self.city)
    }
}
