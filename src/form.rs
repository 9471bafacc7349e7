use crate::errors::InvalidMetricError;
use crate::workout::{Workout, WorkoutKind};

/// Raw form values, exactly as typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl FormInput {
    pub fn running(distance: &str, duration: &str, cadence: &str) -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: cadence.to_string(),
            elevation: String::new(),
        }
    }

    pub fn cycling(distance: &str, duration: &str, elevation: &str) -> Self {
        Self {
            kind: WorkoutKind::Cycling,
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: String::new(),
            elevation: elevation.to_string(),
        }
    }
}

/// Parse one numeric field. Blank counts as missing.
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, InvalidMetricError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InvalidMetricError::Missing { field });
    }
    let value = raw.parse::<f64>().unwrap_or(f64::NAN);
    if !value.is_finite() {
        return Err(InvalidMetricError::NotFinite { field, value });
    }
    Ok(value)
}

/// Workout entry form
pub trait FormIo {
    fn read(&self) -> FormInput;
    fn show(&mut self);
    /// Hide the form and clear its values
    fn hide(&mut self);
    fn focus_distance(&mut self);
    /// Show the cadence row for running, elevation for cycling
    fn show_kind_fields(&mut self, kind: WorkoutKind);
    fn alert(&mut self, message: &str);
}

/// Rendered workout log
pub trait WorkoutListView {
    fn render_entry(&mut self, workout: &Workout);
    fn clear(&mut self);
}

/// Form double whose values are set directly by the test
#[derive(Debug, Default)]
pub struct ScriptedForm {
    pub input: FormInput,
    pub visible: bool,
    pub focused: bool,
    pub kind_fields: WorkoutKind,
    pub alerts: Vec<String>,
}

impl ScriptedForm {
    pub fn fill(&mut self, input: FormInput) {
        self.input = input;
    }
}

impl FormIo for ScriptedForm {
    fn read(&self) -> FormInput {
        self.input.clone()
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.focused = false;
        self.input = FormInput {
            kind: self.input.kind,
            ..FormInput::default()
        };
    }

    fn focus_distance(&mut self) {
        self.focused = true;
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        self.kind_fields = kind;
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// List double keeping the ids it was asked to render
#[derive(Debug, Default)]
pub struct RecordingList {
    pub rendered: Vec<Workout>,
    pub clears: usize,
}

impl WorkoutListView for RecordingList {
    fn render_entry(&mut self, workout: &Workout) {
        self.rendered.push(workout.clone());
    }

    fn clear(&mut self) {
        self.rendered.clear();
        self.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_padded_numbers() {
        assert_eq!(parse_number("distance", "5"), Ok(5.0));
        assert_eq!(parse_number("distance", " 4.25 "), Ok(4.25));
        assert_eq!(parse_number("elevation gain", "-12"), Ok(-12.0));
    }

    #[test]
    fn blank_is_missing() {
        assert_eq!(
            parse_number("cadence", "  "),
            Err(InvalidMetricError::Missing { field: "cadence" })
        );
    }

    #[test]
    fn garbage_and_infinity_are_not_finite() {
        assert!(matches!(
            parse_number("distance", "abc"),
            Err(InvalidMetricError::NotFinite { .. })
        ));
        assert!(matches!(
            parse_number("distance", "inf"),
            Err(InvalidMetricError::NotFinite { .. })
        ));
    }

    #[test]
    fn hide_clears_values_but_keeps_kind() {
        let mut form = ScriptedForm::default();
        form.fill(FormInput::cycling("10", "30", "50"));
        form.show();
        form.hide();
        assert!(!form.visible);
        assert_eq!(form.input.kind, WorkoutKind::Cycling);
        assert!(form.input.distance.is_empty());
    }
}
