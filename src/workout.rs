use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::InvalidMetricError;

/// A latitude/longitude pair, stored as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    #[default]
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn toggled(self) -> Self {
        match self {
            WorkoutKind::Running => WorkoutKind::Cycling,
            WorkoutKind::Cycling => WorkoutKind::Running,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }

    /// Selector value used by the form and the stored records
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutKind::Running => "running",
            WorkoutKind::Cycling => "cycling",
        }
    }
}

impl FromStr for WorkoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(WorkoutKind::Running),
            "cycling" => Ok(WorkoutKind::Cycling),
            other => Err(format!("unknown workout kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific inputs and the metric derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Running { cadence: u32, pace: f64 },
    Cycling { elevation_gain: f64, speed: f64 },
}

/// A single logged activity. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredWorkout", into = "StoredWorkout")]
pub struct Workout {
    id: WorkoutId,
    date: DateTime<Local>,
    distance: f64,
    duration: f64,
    coords: Coords,
    description: String,
    metric: Metric,
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, InvalidMetricError> {
    let value = require_finite(field, value)?;
    if value <= 0.0 {
        return Err(InvalidMetricError::NotPositive { field, value });
    }
    Ok(value)
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<f64, InvalidMetricError> {
    if !value.is_finite() {
        return Err(InvalidMetricError::NotFinite { field, value });
    }
    Ok(value)
}

impl Workout {
    pub fn running(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: u32,
    ) -> Result<Self, InvalidMetricError> {
        let distance = require_positive("distance", distance)?;
        let duration = require_positive("duration", duration)?;
        if cadence == 0 {
            return Err(InvalidMetricError::NotPositive {
                field: "cadence",
                value: 0.0,
            });
        }

        let metric = Metric::Running {
            cadence,
            pace: duration / distance,
        };
        Ok(Self::assemble(id, date, coords, distance, duration, metric))
    }

    pub fn cycling(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Result<Self, InvalidMetricError> {
        let distance = require_positive("distance", distance)?;
        let duration = require_positive("duration", duration)?;
        let elevation_gain = require_finite("elevation gain", elevation_gain)?;

        let metric = Metric::Cycling {
            elevation_gain,
            speed: distance / (duration / 60.0),
        };
        Ok(Self::assemble(id, date, coords, distance, duration, metric))
    }

    fn assemble(
        id: WorkoutId,
        date: DateTime<Local>,
        coords: Coords,
        distance: f64,
        duration: f64,
        metric: Metric,
    ) -> Self {
        let kind = match metric {
            Metric::Running { .. } => WorkoutKind::Running,
            Metric::Cycling { .. } => WorkoutKind::Cycling,
        };
        Self {
            description: describe(kind, &date),
            id,
            date,
            distance,
            duration,
            coords,
            metric,
        }
    }

    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn date(&self) -> DateTime<Local> {
        self.date
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn coords(&self) -> Coords {
        self.coords
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn kind(&self) -> WorkoutKind {
        match self.metric {
            Metric::Running { .. } => WorkoutKind::Running,
            Metric::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// Minutes per kilometre, running only
    pub fn pace(&self) -> Option<f64> {
        match self.metric {
            Metric::Running { pace, .. } => Some(pace),
            Metric::Cycling { .. } => None,
        }
    }

    /// Kilometres per hour, cycling only
    pub fn speed(&self) -> Option<f64> {
        match self.metric {
            Metric::Cycling { speed, .. } => Some(speed),
            Metric::Running { .. } => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        self.kind().icon()
    }

    pub fn popup_content(&self) -> String {
        format!("{} {}", self.icon(), self.description)
    }

    pub fn popup_class(&self) -> String {
        format!("{}-popup", self.kind().as_str())
    }

    /// The value/unit rows shown for a list entry
    pub fn details(&self) -> Vec<Detail> {
        let mut rows = vec![
            Detail::new(self.icon(), format!("{}", self.distance), "km"),
            Detail::new("⏱", format!("{}", self.duration), "min"),
        ];
        match self.metric {
            Metric::Running { cadence, pace } => {
                rows.push(Detail::new("⚡️", format!("{pace:.1}"), "min/km"));
                rows.push(Detail::new("🦶🏼", cadence.to_string(), "spm"));
            }
            Metric::Cycling {
                elevation_gain,
                speed,
            } => {
                rows.push(Detail::new("⚡️", format!("{speed:.1}"), "km/h"));
                rows.push(Detail::new("⛰", format!("{elevation_gain}"), "m"));
            }
        }
        rows
    }
}

fn describe(kind: WorkoutKind, date: &DateTime<Local>) -> String {
    format!("{} on {}", kind, date.format("%B %-d"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

impl Detail {
    fn new(icon: &'static str, value: String, unit: &'static str) -> Self {
        Self { icon, value, unit }
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.icon, self.value, self.unit)
    }
}

/// On-disk record shape. Derived metrics are written for readers of the raw
/// JSON but recomputed on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWorkout {
    id: WorkoutId,
    date: DateTime<Local>,
    distance: f64,
    duration: f64,
    coords: Coords,
    #[serde(default)]
    description: String,
    #[serde(alias = "type")]
    kind: WorkoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cadence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
}

impl From<Workout> for StoredWorkout {
    fn from(w: Workout) -> Self {
        let kind = w.kind();
        let (cadence, pace, elevation_gain, speed) = match w.metric {
            Metric::Running { cadence, pace } => (Some(cadence), Some(pace), None, None),
            Metric::Cycling {
                elevation_gain,
                speed,
            } => (None, None, Some(elevation_gain), Some(speed)),
        };
        Self {
            id: w.id,
            date: w.date,
            distance: w.distance,
            duration: w.duration,
            coords: w.coords,
            description: w.description,
            kind,
            cadence,
            elevation_gain,
            pace,
            speed,
        }
    }
}

impl TryFrom<StoredWorkout> for Workout {
    type Error = InvalidMetricError;

    fn try_from(s: StoredWorkout) -> Result<Self, Self::Error> {
        let mut workout = match s.kind {
            WorkoutKind::Running => {
                let cadence = s
                    .cadence
                    .ok_or(InvalidMetricError::Missing { field: "cadence" })?;
                Workout::running(s.id, s.date, s.coords, s.distance, s.duration, cadence)?
            }
            WorkoutKind::Cycling => {
                let elevation_gain = s.elevation_gain.ok_or(InvalidMetricError::Missing {
                    field: "elevation gain",
                })?;
                Workout::cycling(
                    s.id,
                    s.date,
                    s.coords,
                    s.distance,
                    s.duration,
                    elevation_gain,
                )?
            }
        };
        // keep the label the record was created with
        if !s.description.is_empty() {
            workout.description = s.description;
        }
        Ok(workout)
    }
}
