use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::form::{FormInput, FormIo};
use crate::workout::WorkoutKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Kind,
    Distance,
    Duration,
    /// Cadence or elevation gain, depending on the selected kind
    Extra,
}

const FIELDS: [Field; 4] = [Field::Kind, Field::Distance, Field::Duration, Field::Extra];

/// The workout entry form as a terminal panel
#[derive(Debug, Default)]
pub struct TerminalForm {
    visible: bool,
    kind: WorkoutKind,
    extra_kind: WorkoutKind,
    distance: String,
    duration: String,
    cadence: String,
    elevation: String,
    focus: usize,
    alert: Option<String>,
}

impl TerminalForm {
    pub fn new(kind: WorkoutKind) -> Self {
        Self {
            kind,
            extra_kind: kind,
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn kind(&self) -> WorkoutKind {
        self.kind
    }

    pub fn focused_field(&self) -> Field {
        FIELDS[self.focus]
    }

    pub fn alert_message(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FIELDS.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
    }

    /// Flip the kind selector, returning the new selection
    pub fn toggle_kind(&mut self) -> WorkoutKind {
        self.kind = self.kind.toggled();
        self.kind
    }

    pub fn input_char(&mut self, c: char) {
        if !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')) {
            return;
        }
        if let Some(value) = self.focused_value_mut() {
            value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(value) = self.focused_value_mut() {
            value.pop();
        }
    }

    fn focused_value_mut(&mut self) -> Option<&mut String> {
        match FIELDS[self.focus] {
            Field::Kind => None,
            Field::Distance => Some(&mut self.distance),
            Field::Duration => Some(&mut self.duration),
            Field::Extra => match self.extra_kind {
                WorkoutKind::Running => Some(&mut self.cadence),
                WorkoutKind::Cycling => Some(&mut self.elevation),
            },
        }
    }

    fn row<'a>(&self, field: Field, label: &'a str, value: String) -> Line<'a> {
        let focused = self.visible && FIELDS[self.focus] == field;
        let value_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Line::from(vec![
            Span::styled(format!("{label:<10}"), Style::default().fg(Color::Gray)),
            Span::styled(value, value_style),
        ])
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let (extra_label, extra_value) = match self.extra_kind {
            WorkoutKind::Running => ("Cadence", format!("{} spm", self.cadence)),
            WorkoutKind::Cycling => ("Elev Gain", format!("{} m", self.elevation)),
        };
        let lines = vec![
            self.row(
                Field::Kind,
                "Type",
                format!("◀ {} ▶", self.kind.as_str()),
            ),
            self.row(Field::Distance, "Distance", format!("{} km", self.distance)),
            self.row(Field::Duration, "Duration", format!("{} min", self.duration)),
            self.row(Field::Extra, extra_label, extra_value),
        ];

        Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" New workout · enter to save, esc to cancel ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .render(area, buf);
    }
}

impl FormIo for TerminalForm {
    fn read(&self) -> FormInput {
        FormInput {
            kind: self.kind,
            distance: self.distance.clone(),
            duration: self.duration.clone(),
            cadence: self.cadence.clone(),
            elevation: self.elevation.clone(),
        }
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.focus = 0;
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }

    fn focus_distance(&mut self) {
        self.focus = 1;
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        self.extra_kind = kind;
    }

    fn alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }
}
