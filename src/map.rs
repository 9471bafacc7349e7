use crate::errors::GeolocationUnavailableError;
use crate::workout::{Coords, WorkoutId};

pub const DEFAULT_ZOOM: u8 = 13;

/// A pin with an always-open popup
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub workout_id: WorkoutId,
    pub coords: Coords,
    pub popup_content: String,
    pub style_class: String,
}

/// Map widget boundary. Clicks come back as `UiEvent::MapClicked`.
pub trait MapAdapter {
    fn set_view(&mut self, coords: Coords, zoom: u8);
    fn add_marker(&mut self, marker: Marker);
    fn clear_markers(&mut self);
}

/// Source of the user's starting position, queried once at startup
pub trait GeolocationProvider: Send + 'static {
    fn current_position(&mut self) -> Result<Coords, GeolocationUnavailableError>;
}

/// Position taken from the command line or config, if any was given
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGeolocation {
    position: Option<Coords>,
}

impl StaticGeolocation {
    pub fn new(position: Option<Coords>) -> Self {
        Self { position }
    }
}

impl GeolocationProvider for StaticGeolocation {
    fn current_position(&mut self) -> Result<Coords, GeolocationUnavailableError> {
        self.position.ok_or(GeolocationUnavailableError::Unsupported)
    }
}

/// Call recorded by `RecordingMap`
#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    SetView(Coords, u8),
    AddMarker(Marker),
    ClearMarkers,
}

/// Test map that only remembers what it was asked to do
#[derive(Debug, Default)]
pub struct RecordingMap {
    pub calls: Vec<MapCall>,
}

impl RecordingMap {
    pub fn markers(&self) -> Vec<&Marker> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MapCall::AddMarker(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn last_view(&self) -> Option<(Coords, u8)> {
        self.calls.iter().rev().find_map(|c| match c {
            MapCall::SetView(coords, zoom) => Some((*coords, *zoom)),
            _ => None,
        })
    }
}

impl MapAdapter for RecordingMap {
    fn set_view(&mut self, coords: Coords, zoom: u8) {
        self.calls.push(MapCall::SetView(coords, zoom));
    }

    fn add_marker(&mut self, marker: Marker) {
        self.calls.push(MapCall::AddMarker(marker));
    }

    fn clear_markers(&mut self) {
        self.calls.push(MapCall::ClearMarkers);
    }
}
