use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Paragraph, Widget},
    Frame,
};
use tracing::debug;

use crate::controller::{Controller, Dispatch, UiEvent};
use crate::identity::Clock;
use crate::keymap::{self, Action, Focus};
use crate::runtime::AppEvent;
use crate::storage::KeyValueStore;
use crate::ui::{form::Field, form::TerminalForm, list::TerminalList, map::TerminalMap};

pub type TuiController<K, C> = Controller<TerminalMap, TerminalForm, TerminalList, K, C>;

/// Terminal shell around the controller: focus, layout and key handling
pub struct App<K, C> {
    pub controller: TuiController<K, C>,
    pub focus: Focus,
    pub status: Option<String>,
    confirm_reset: bool,
    map_area: Option<Rect>,
}

impl<K: KeyValueStore, C: Clock> App<K, C> {
    pub fn new(controller: TuiController<K, C>) -> Self {
        Self {
            controller,
            focus: Focus::Map,
            status: None,
            confirm_reset: false,
            map_area: None,
        }
    }

    /// Apply one event. Returns false when the user asked to quit.
    pub fn handle(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Mouse(mouse) => {
                self.on_mouse(mouse);
                true
            }
            AppEvent::Position(position) => {
                self.controller.on_position(position);
                true
            }
            AppEvent::Resize | AppEvent::Tick => true,
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> bool {
        let on_kind_row = self.controller.form().focused_field() == Field::Kind;
        match keymap::resolve(self.focus, on_kind_row, key) {
            Some(Action::Quit) => false,
            Some(action) => {
                self.apply(action);
                true
            }
            None => true,
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (Some(area), Some(view)) = (self.map_area, self.controller.map().viewport()) else {
            return;
        };
        if let Some(coords) = view.coords_at(TerminalMap::inner(area), mouse.column, mouse.row) {
            self.ui(UiEvent::MapClicked(coords));
        }
    }

    pub fn apply(&mut self, action: Action) {
        debug!(?action, focus = ?self.focus, "action");
        if !matches!(action, Action::AskReset | Action::ConfirmReset) {
            self.confirm_reset = false;
        }

        match action {
            Action::Ui(event) => self.ui(event),
            Action::ClickCenter => {
                if let Some(view) = self.controller.map().viewport() {
                    self.ui(UiEvent::MapClicked(view.center));
                } else {
                    self.status = Some("The map isn't available yet".to_string());
                }
            }
            Action::Pan { lat, lng } => self.controller.map_mut().pan(lat, lng),
            Action::Zoom(delta) => self.controller.map_mut().zoom_by(delta),
            Action::NextField => self.controller.form_mut().next_field(),
            Action::PrevField => self.controller.form_mut().prev_field(),
            Action::ToggleKind => {
                let kind = self.controller.form_mut().toggle_kind();
                self.ui(UiEvent::KindChanged(kind));
            }
            Action::Input(c) => self.controller.form_mut().input_char(c),
            Action::Backspace => self.controller.form_mut().backspace(),
            Action::SelectNext => self.controller.list_mut().select_next(),
            Action::SelectPrev => self.controller.list_mut().select_prev(),
            Action::OpenSelected => {
                if let Some(id) = self.controller.list().selected_id().cloned() {
                    self.ui(UiEvent::EntrySelected(id));
                }
            }
            Action::FocusNext => {
                self.focus = match self.focus {
                    Focus::Map => Focus::List,
                    Focus::List | Focus::Form => Focus::Map,
                };
            }
            Action::AskReset => {
                self.confirm_reset = true;
                self.status = Some("Delete every workout? press y to confirm".to_string());
            }
            Action::ConfirmReset => {
                if self.confirm_reset {
                    self.confirm_reset = false;
                    self.ui(UiEvent::Reset);
                }
            }
            Action::DismissAlert => {
                self.controller.form_mut().dismiss_alert();
                self.status = None;
            }
            Action::Quit => {}
        }
    }

    fn ui(&mut self, event: UiEvent) {
        match self.controller.dispatch(event) {
            Dispatch::FormOpened(coords) => {
                self.focus = Focus::Form;
                self.status = Some(format!("New workout at {coords}"));
            }
            Dispatch::Committed(_) => {
                self.focus = Focus::Map;
                self.status = self
                    .controller
                    .workouts()
                    .last()
                    .map(|w| format!("Saved {}", w.description()));
            }
            Dispatch::Rejected(e) => {
                self.status = Some(format!("Inputs have to be positive numbers: {e}"));
            }
            Dispatch::Cancelled => {
                self.focus = Focus::Map;
                self.status = None;
            }
            Dispatch::Reset => {
                self.focus = Focus::Map;
                self.status = Some("All workouts removed".to_string());
            }
            Dispatch::Ignored(reason) => {
                self.status = Some(reason.to_string());
            }
            Dispatch::FieldsToggled(_) | Dispatch::Recentered(_) => {}
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(f.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[0]);

        let form_visible = self.controller.form().is_visible();
        let form_height = if form_visible { 6 } else { 0 };
        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(form_height), Constraint::Min(0)])
            .split(columns[0]);

        self.map_area = Some(columns[1]);
        let buf = f.buffer_mut();
        if form_visible {
            self.controller.form().render(sidebar[0], buf);
        }
        self.controller
            .list()
            .render(sidebar[1], buf, self.focus == Focus::List);
        self.controller
            .map()
            .render(columns[1], buf, self.focus == Focus::Map);

        self.status_line().render(rows[1], buf);
    }

    fn status_line(&self) -> Paragraph<'static> {
        if let Some(alert) = self.controller.form().alert_message() {
            return Paragraph::new(Span::styled(
                alert.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        let text = match &self.status {
            Some(status) => status.clone(),
            None => match self.focus {
                Focus::Map => "(enter) log here  (arrows) pan  (+/-) zoom  (tab) list  (R)eset  (q)uit",
                Focus::List => "(enter) show on map  (up/down) select  (tab) map  (q)uit",
                Focus::Form => "(tab) next field  (left/right) type  (enter) save  (esc) cancel",
            }
            .to_string(),
        };
        Paragraph::new(Span::styled(
            text,
            Style::default().add_modifier(Modifier::ITALIC),
        ))
    }
}
