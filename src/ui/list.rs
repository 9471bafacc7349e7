use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use crate::form::WorkoutListView;
use crate::workout::{Workout, WorkoutId, WorkoutKind};

/// One rendered entry of the workout log
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub kind: WorkoutKind,
    pub title: String,
    pub details: String,
}

impl From<&Workout> for ListEntry {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id().clone(),
            kind: w.kind(),
            title: w.description().to_string(),
            details: w.details().iter().join("   "),
        }
    }
}

/// Workout log panel, newest entry on top
#[derive(Debug, Default)]
pub struct TerminalList {
    entries: Vec<ListEntry>,
    selected: usize,
}

impl TerminalList {
    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_id(&self) -> Option<&WorkoutId> {
        self.entries.get(self.selected).map(|e| &e.id)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, focused: bool) {
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let accent = match entry.kind {
                    WorkoutKind::Running => Color::Green,
                    WorkoutKind::Cycling => Color::Rgb(255, 165, 0),
                };
                ListItem::new(vec![
                    Line::from(Span::styled(
                        entry.title.clone(),
                        Style::default().fg(accent).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(entry.details.clone()),
                ])
            })
            .collect();

        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" Workouts ({}) ", self.entries.len()))
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("▌");

        let mut state = ListState::default();
        if focused && !self.entries.is_empty() {
            state.select(Some(self.selected));
        }
        StatefulWidget::render(list, area, buf, &mut state);
    }
}

impl WorkoutListView for TerminalList {
    fn render_entry(&mut self, workout: &Workout) {
        self.entries.insert(0, ListEntry::from(workout));
        self.selected = 0;
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.selected = 0;
    }
}
