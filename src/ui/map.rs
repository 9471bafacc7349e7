use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        Block, Borders, Paragraph, Widget, Wrap,
    },
};

use crate::map::{MapAdapter, Marker};
use crate::workout::Coords;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;

/// Visible region of the map: a centre and a zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coords,
    pub zoom: u8,
}

impl Viewport {
    /// Degrees of longitude across the view
    pub fn lng_span(&self) -> f64 {
        (1440.0 / 2f64.powi(self.zoom as i32)).min(360.0)
    }

    /// Terminal cells are about twice as tall as wide
    pub fn lat_span(&self) -> f64 {
        (self.lng_span() / 2.0).min(180.0)
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.lng_span() / 2.0;
        [self.center.lng - half, self.center.lng + half]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.lat_span() / 2.0;
        [self.center.lat - half, self.center.lat + half]
    }

    /// Map a terminal cell inside `inner` to the coordinates under it.
    /// Cells beyond a pole have none; longitude wraps around the antimeridian.
    pub fn coords_at(&self, inner: Rect, column: u16, row: u16) -> Option<Coords> {
        if inner.width == 0 || inner.height == 0 || !inner.contains((column, row).into()) {
            return None;
        }
        let [west, east] = self.x_bounds();
        let [south, north] = self.y_bounds();
        let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
        let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
        let lat = north - fy * (north - south);
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some(Coords::new(lat, wrap_lng(west + fx * (east - west))))
    }

    /// Move by a fraction of the visible span
    pub fn panned(&self, lat_steps: f64, lng_steps: f64) -> Self {
        let step = 0.1;
        let lat = (self.center.lat + lat_steps * step * self.lat_span()).clamp(-85.0, 85.0);
        let lng = wrap_lng(self.center.lng + lng_steps * step * self.lng_span());
        Self {
            center: Coords::new(lat, lng),
            zoom: self.zoom,
        }
    }

    pub fn zoomed(&self, delta: i8) -> Self {
        let zoom = (self.zoom as i16 + delta as i16).clamp(MIN_ZOOM as i16, MAX_ZOOM as i16);
        Self {
            center: self.center,
            zoom: zoom as u8,
        }
    }
}

fn wrap_lng(lng: f64) -> f64 {
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// World map drawn on a braille canvas
#[derive(Debug, Default)]
pub struct TerminalMap {
    viewport: Option<Viewport>,
    markers: Vec<Marker>,
}

impl TerminalMap {
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn pan(&mut self, lat_steps: f64, lng_steps: f64) {
        if let Some(v) = self.viewport {
            self.viewport = Some(v.panned(lat_steps, lng_steps));
        }
    }

    pub fn zoom_by(&mut self, delta: i8) {
        if let Some(v) = self.viewport {
            self.viewport = Some(v.zoomed(delta));
        }
    }

    /// Inner drawing area for a map rendered into `area`
    pub fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(area)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, focused: bool) {
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let Some(view) = self.viewport else {
            let block = Block::default()
                .title(" Map ")
                .borders(Borders::ALL)
                .border_style(border_style);
            Paragraph::new(Span::styled(
                "Waiting for your location…",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
            return;
        };

        let title = format!(" Map · {} · z{} ", view.center, view.zoom);
        let running: Vec<(f64, f64)> = self.points_for("running-popup");
        let cycling: Vec<(f64, f64)> = self.points_for("cycling-popup");

        Canvas::default()
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .marker(symbols::Marker::Braille)
            .x_bounds(view.x_bounds())
            .y_bounds(view.y_bounds())
            .paint(|ctx| {
                ctx.draw(&Map {
                    color: Color::DarkGray,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                ctx.draw(&Points {
                    coords: &running,
                    color: Color::Green,
                });
                ctx.draw(&Points {
                    coords: &cycling,
                    color: Color::Rgb(255, 165, 0),
                });
                for marker in &self.markers {
                    ctx.print(
                        marker.coords.lng,
                        marker.coords.lat,
                        Line::styled(
                            marker.popup_content.clone(),
                            popup_style(&marker.style_class),
                        ),
                    );
                }
                ctx.print(view.center.lng, view.center.lat, Line::from("+"));
            })
            .render(area, buf);
    }

    fn points_for(&self, class: &str) -> Vec<(f64, f64)> {
        self.markers
            .iter()
            .filter(|m| m.style_class == class)
            .map(|m| (m.coords.lng, m.coords.lat))
            .collect()
    }
}

fn popup_style(class: &str) -> Style {
    match class {
        "running-popup" => Style::default().fg(Color::Green),
        "cycling-popup" => Style::default().fg(Color::Rgb(255, 165, 0)),
        _ => Style::default(),
    }
    .add_modifier(Modifier::BOLD)
}

impl MapAdapter for TerminalMap {
    fn set_view(&mut self, coords: Coords, zoom: u8) {
        self.viewport = Some(Viewport {
            center: coords,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        });
    }

    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }
}
