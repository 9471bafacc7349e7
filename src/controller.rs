use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

use crate::errors::{GeolocationUnavailableError, InvalidMetricError};
use crate::form::{parse_number, FormInput, FormIo, WorkoutListView};
use crate::identity::{Clock, IdGenerator};
use crate::map::{MapAdapter, Marker};
use crate::persistence::WorkoutStore;
use crate::storage::KeyValueStore;
use crate::workout::{require_finite, require_positive, Coords, Workout, WorkoutId, WorkoutKind};

/// Where the controller is in the click → form → commit cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState {
    /// No form shown
    Idle,
    /// Map clicked, form open, waiting for a submission
    AwaitingInput { coords: Coords },
    /// Submission received, fields being checked
    Validating { coords: Coords },
}

/// Named UI events, independent of the key or mouse binding that produced them
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    MapClicked(Coords),
    KindChanged(WorkoutKind),
    Submit,
    Cancel,
    EntrySelected(WorkoutId),
    Reset,
}

/// What a dispatched event did
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    FormOpened(Coords),
    FieldsToggled(WorkoutKind),
    Committed(WorkoutId),
    Rejected(InvalidMetricError),
    Cancelled,
    Recentered(WorkoutId),
    Reset,
    Ignored(&'static str),
}

/// Owns the workout log and drives the map, form, list and store.
pub struct Controller<M, F, L, K, C> {
    map: M,
    form: F,
    list: L,
    store: WorkoutStore<K>,
    clock: C,
    zoom: u8,
    workouts: Vec<Workout>,
    ids: IdGenerator,
    state: ControllerState,
    map_ready: bool,
    replay: VecDeque<WorkoutId>,
}

impl<M, F, L, K, C> Controller<M, F, L, K, C>
where
    M: MapAdapter,
    F: FormIo,
    L: WorkoutListView,
    K: KeyValueStore,
    C: Clock,
{
    /// Restores the stored log and renders it. Markers wait for the map.
    pub fn new(map: M, form: F, mut list: L, store: WorkoutStore<K>, clock: C, zoom: u8) -> Self {
        let workouts = store.load();
        for workout in &workouts {
            list.render_entry(workout);
        }
        if !workouts.is_empty() {
            info!(count = workouts.len(), "restored workouts");
        }

        Self {
            ids: IdGenerator::seeded(workouts.iter().map(Workout::id)),
            replay: workouts.iter().map(|w| w.id().clone()).collect(),
            map,
            form,
            list,
            store,
            clock,
            zoom,
            workouts,
            state: ControllerState::Idle,
            map_ready: false,
        }
    }

    /// Geolocation result. Success creates the map view and replays markers.
    pub fn on_position(&mut self, position: Result<Coords, GeolocationUnavailableError>) {
        match position {
            Ok(coords) => {
                info!(%coords, "position resolved");
                self.map.set_view(coords, self.zoom);
                self.map_ready = true;
                while let Some(id) = self.replay.pop_front() {
                    if let Some(workout) = self.workouts.iter().find(|w| *w.id() == id) {
                        self.map.add_marker(marker_for(workout));
                    }
                }
            }
            Err(e) => {
                warn!("position unavailable: {e}");
                self.form.alert(&format!(
                    "The map doesn't work without your location ({e}). Start with --lat/--lon or set a home position in the config."
                ));
            }
        }
    }

    pub fn dispatch(&mut self, event: UiEvent) -> Dispatch {
        debug!(?event, state = ?self.state, "dispatch");
        match event {
            UiEvent::MapClicked(coords) => self.open_form(coords),
            UiEvent::KindChanged(kind) => {
                self.form.show_kind_fields(kind);
                Dispatch::FieldsToggled(kind)
            }
            UiEvent::Submit => self.submit(),
            UiEvent::Cancel => self.cancel(),
            UiEvent::EntrySelected(id) => self.recenter(id),
            UiEvent::Reset => self.reset(),
        }
    }

    fn open_form(&mut self, coords: Coords) -> Dispatch {
        if !self.map_ready {
            return Dispatch::Ignored("map is not ready");
        }
        self.state = ControllerState::AwaitingInput { coords };
        self.form.show();
        self.form.focus_distance();
        Dispatch::FormOpened(coords)
    }

    fn submit(&mut self) -> Dispatch {
        let ControllerState::AwaitingInput { coords } = self.state else {
            return Dispatch::Ignored("no form is open");
        };
        self.state = ControllerState::Validating { coords };

        let input = self.form.read();
        match self.build_workout(&input, coords) {
            Ok(workout) => self.commit(workout),
            Err(e) => {
                debug!("submission rejected: {e}");
                self.state = ControllerState::AwaitingInput { coords };
                Dispatch::Rejected(e)
            }
        }
    }

    /// Every required field must be finite and positive; elevation gain only
    /// has to be finite.
    fn build_workout(
        &mut self,
        input: &FormInput,
        coords: Coords,
    ) -> Result<Workout, InvalidMetricError> {
        let distance = require_positive("distance", parse_number("distance", &input.distance)?)?;
        let duration = require_positive("duration", parse_number("duration", &input.duration)?)?;

        match input.kind {
            WorkoutKind::Running => {
                let cadence = parse_cadence(&input.cadence)?;
                let date = self.clock.now();
                let id = self.ids.next(date);
                Workout::running(id, date, coords, distance, duration, cadence)
            }
            WorkoutKind::Cycling => {
                let elevation = require_finite(
                    "elevation gain",
                    parse_number("elevation gain", &input.elevation)?,
                )?;
                let date = self.clock.now();
                let id = self.ids.next(date);
                Workout::cycling(id, date, coords, distance, duration, elevation)
            }
        }
    }

    fn commit(&mut self, workout: Workout) -> Dispatch {
        let id = workout.id().clone();
        self.map.add_marker(marker_for(&workout));
        self.list.render_entry(&workout);
        self.form.hide();
        info!(%id, kind = %workout.kind(), "workout logged");
        self.workouts.push(workout);

        if let Err(e) = self.store.save(&self.workouts) {
            error!("failed to persist workouts: {e}");
        }
        self.state = ControllerState::Idle;
        Dispatch::Committed(id)
    }

    fn cancel(&mut self) -> Dispatch {
        match self.state {
            ControllerState::Idle => Dispatch::Ignored("no form is open"),
            _ => {
                self.form.hide();
                self.state = ControllerState::Idle;
                Dispatch::Cancelled
            }
        }
    }

    fn recenter(&mut self, id: WorkoutId) -> Dispatch {
        if !self.map_ready {
            return Dispatch::Ignored("map is not ready");
        }
        match self.workouts.iter().find(|w| *w.id() == id) {
            Some(workout) => {
                self.map.set_view(workout.coords(), self.zoom);
                Dispatch::Recentered(id)
            }
            None => Dispatch::Ignored("no workout with that id"),
        }
    }

    fn reset(&mut self) -> Dispatch {
        self.store.clear();
        self.workouts.clear();
        self.replay.clear();
        self.list.clear();
        if self.map_ready {
            self.map.clear_markers();
        }
        self.form.hide();
        self.state = ControllerState::Idle;
        info!("workout log reset");
        Dispatch::Reset
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn map_ready(&self) -> bool {
        self.map_ready
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut L {
        &mut self.list
    }
}

fn parse_cadence(raw: &str) -> Result<u32, InvalidMetricError> {
    let value = require_positive("cadence", parse_number("cadence", raw)?)?;
    if value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(InvalidMetricError::NotWhole {
            field: "cadence",
            value,
        });
    }
    Ok(value as u32)
}

pub fn marker_for(workout: &Workout) -> Marker {
    Marker {
        workout_id: workout.id().clone(),
        coords: workout.coords(),
        popup_content: workout.popup_content(),
        style_class: workout.popup_class(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{RecordingList, ScriptedForm};
    use crate::identity::ManualClock;
    use crate::map::{MapCall, RecordingMap};
    use crate::persistence::WORKOUTS_KEY;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::{Local, TimeZone};

    type TestController = Controller<RecordingMap, ScriptedForm, RecordingList, MemoryStore, ManualClock>;

    fn clock() -> ManualClock {
        ManualClock::new(Local.with_ymd_and_hms(2024, 5, 14, 18, 0, 0).unwrap())
    }

    fn controller_with(kv: MemoryStore) -> TestController {
        Controller::new(
            RecordingMap::default(),
            ScriptedForm::default(),
            RecordingList::default(),
            WorkoutStore::new(kv),
            clock(),
            13,
        )
    }

    fn ready_controller(kv: MemoryStore) -> TestController {
        let mut c = controller_with(kv);
        c.on_position(Ok(Coords::new(10.0, 20.0)));
        c
    }

    fn submit(c: &mut TestController, at: Coords, input: FormInput) -> Dispatch {
        c.dispatch(UiEvent::MapClicked(at));
        c.form_mut().fill(input);
        c.dispatch(UiEvent::Submit)
    }

    #[test]
    fn running_submission_is_committed_with_pace() {
        let kv = MemoryStore::new();
        let mut c = ready_controller(kv.clone());

        let outcome = submit(&mut c, Coords::new(10.0, 20.0), FormInput::running("5", "30", "180"));
        assert_matches!(outcome, Dispatch::Committed(_));

        assert_eq!(c.workouts().len(), 1);
        let w = &c.workouts()[0];
        assert_eq!(w.pace(), Some(6.0));
        assert_eq!(w.coords(), Coords::new(10.0, 20.0));
        assert_eq!(c.state(), ControllerState::Idle);
        assert!(!c.form().visible);
        assert_eq!(c.list().rendered.len(), 1);
        assert!(kv.raw(WORKOUTS_KEY).is_some());

        let marker = c.map().markers()[0].clone();
        assert_eq!(marker.style_class, "running-popup");
        assert_eq!(marker.popup_content, "🏃‍♂️ Running on May 14");
    }

    #[test]
    fn cycling_submission_is_committed_with_speed() {
        let mut c = ready_controller(MemoryStore::new());
        let outcome = submit(&mut c, Coords::new(1.0, 2.0), FormInput::cycling("20", "60", "150"));
        assert_matches!(outcome, Dispatch::Committed(_));
        assert_eq!(c.workouts()[0].speed(), Some(20.0));
        assert_eq!(c.map().markers()[0].style_class, "cycling-popup");
    }

    #[test]
    fn negative_distance_keeps_form_open() {
        let kv = MemoryStore::new();
        let mut c = ready_controller(kv.clone());
        let outcome = submit(&mut c, Coords::new(10.0, 20.0), FormInput::running("-1", "30", "180"));

        assert_matches!(
            outcome,
            Dispatch::Rejected(InvalidMetricError::NotPositive { field: "distance", .. })
        );
        assert!(c.workouts().is_empty());
        assert_eq!(
            c.state(),
            ControllerState::AwaitingInput {
                coords: Coords::new(10.0, 20.0)
            }
        );
        assert!(c.form().visible);
        assert!(kv.raw(WORKOUTS_KEY).is_none());
        assert!(c.map().markers().is_empty());
    }

    #[test]
    fn every_required_field_must_be_valid() {
        let mut c = ready_controller(MemoryStore::new());
        let rejected = [
            FormInput::running("5", "", "180"),
            FormInput::running("5", "30", "0"),
            FormInput::running("5", "30", "172.5"),
            FormInput::running("abc", "30", "180"),
            FormInput::running("5", "-30", "180"),
            FormInput::cycling("5", "30", ""),
            FormInput::cycling("5", "30", "NaN"),
            FormInput::cycling("0", "30", "10"),
        ];
        for input in rejected {
            let outcome = submit(&mut c, Coords::new(0.0, 0.0), input.clone());
            assert_matches!(outcome, Dispatch::Rejected(_), "{input:?}");
        }
        assert!(c.workouts().is_empty());
    }

    #[test]
    fn rejected_submission_can_be_corrected() {
        let mut c = ready_controller(MemoryStore::new());
        submit(&mut c, Coords::new(0.0, 0.0), FormInput::running("5", "30", ""));
        c.form_mut().fill(FormInput::running("5", "30", "170"));
        assert_matches!(c.dispatch(UiEvent::Submit), Dispatch::Committed(_));
        assert_eq!(c.workouts()[0].coords(), Coords::new(0.0, 0.0));
    }

    #[test]
    fn cycling_accepts_descent() {
        let mut c = ready_controller(MemoryStore::new());
        let outcome = submit(&mut c, Coords::new(0.0, 0.0), FormInput::cycling("30", "45", "-250"));
        assert_matches!(outcome, Dispatch::Committed(_));
    }

    #[test]
    fn clicks_before_the_map_exists_are_ignored() {
        let mut c = controller_with(MemoryStore::new());
        assert_matches!(
            c.dispatch(UiEvent::MapClicked(Coords::new(1.0, 1.0))),
            Dispatch::Ignored(_)
        );
        assert_eq!(c.state(), ControllerState::Idle);
        assert!(!c.form().visible);
    }

    #[test]
    fn submit_without_a_click_is_ignored() {
        let mut c = ready_controller(MemoryStore::new());
        c.form_mut().fill(FormInput::running("5", "30", "180"));
        assert_matches!(c.dispatch(UiEvent::Submit), Dispatch::Ignored(_));
        assert!(c.workouts().is_empty());
    }

    #[test]
    fn second_click_moves_pending_coordinates() {
        let mut c = ready_controller(MemoryStore::new());
        c.dispatch(UiEvent::MapClicked(Coords::new(1.0, 1.0)));
        c.dispatch(UiEvent::MapClicked(Coords::new(2.0, 2.0)));
        c.form_mut().fill(FormInput::running("5", "30", "180"));
        c.dispatch(UiEvent::Submit);
        assert_eq!(c.workouts()[0].coords(), Coords::new(2.0, 2.0));
    }

    #[test]
    fn cancel_closes_the_form() {
        let mut c = ready_controller(MemoryStore::new());
        c.dispatch(UiEvent::MapClicked(Coords::new(1.0, 1.0)));
        assert_eq!(c.dispatch(UiEvent::Cancel), Dispatch::Cancelled);
        assert_eq!(c.state(), ControllerState::Idle);
        assert!(!c.form().visible);
        assert_matches!(c.dispatch(UiEvent::Cancel), Dispatch::Ignored(_));
    }

    #[test]
    fn kind_change_toggles_fields() {
        let mut c = ready_controller(MemoryStore::new());
        assert_eq!(
            c.dispatch(UiEvent::KindChanged(WorkoutKind::Cycling)),
            Dispatch::FieldsToggled(WorkoutKind::Cycling)
        );
        assert_eq!(c.form().kind_fields, WorkoutKind::Cycling);
    }

    #[test]
    fn stored_workouts_render_before_any_click() {
        let kv = MemoryStore::new();
        {
            let mut first = ready_controller(kv.clone());
            submit(&mut first, Coords::new(10.0, 20.0), FormInput::running("5", "30", "180"));
        }

        let c = controller_with(kv);
        assert_eq!(c.workouts().len(), 1);
        assert_eq!(c.list().rendered.len(), 1);
        assert!(c.map().calls.is_empty());
        assert_eq!(c.workouts()[0].pace(), Some(6.0));
    }

    #[test]
    fn markers_replay_in_order_once_the_map_exists() {
        let kv = MemoryStore::new();
        let expected: Vec<WorkoutId> = {
            let mut first = ready_controller(kv.clone());
            submit(&mut first, Coords::new(1.0, 1.0), FormInput::running("5", "30", "180"));
            submit(&mut first, Coords::new(2.0, 2.0), FormInput::cycling("20", "60", "10"));
            submit(&mut first, Coords::new(3.0, 3.0), FormInput::running("3", "20", "170"));
            first.workouts().iter().map(|w| w.id().clone()).collect()
        };

        let mut c = controller_with(kv);
        c.on_position(Ok(Coords::new(0.0, 0.0)));
        assert_eq!(c.map().calls[0], MapCall::SetView(Coords::new(0.0, 0.0), 13));
        let replayed: Vec<WorkoutId> = c
            .map()
            .markers()
            .iter()
            .map(|m| m.workout_id.clone())
            .collect();
        assert_eq!(replayed, expected);
    }

    #[test]
    fn ids_stay_unique_within_a_session() {
        let mut c = ready_controller(MemoryStore::new());
        for _ in 0..5 {
            submit(&mut c, Coords::new(0.0, 0.0), FormInput::running("5", "30", "180"));
        }
        let mut ids: Vec<_> = c.workouts().iter().map(|w| w.id().clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn new_ids_do_not_collide_with_restored_ones() {
        let kv = MemoryStore::new();
        {
            let mut first = ready_controller(kv.clone());
            submit(&mut first, Coords::new(0.0, 0.0), FormInput::running("5", "30", "180"));
        }
        // same clock reading as the first session
        let mut c = ready_controller(kv);
        submit(&mut c, Coords::new(0.0, 0.0), FormInput::running("5", "30", "180"));
        assert_ne!(c.workouts()[0].id(), c.workouts()[1].id());
    }

    #[test]
    fn selecting_an_entry_recenters_the_map() {
        let mut c = ready_controller(MemoryStore::new());
        submit(&mut c, Coords::new(5.0, 6.0), FormInput::running("5", "30", "180"));
        let id = c.workouts()[0].id().clone();

        assert_eq!(
            c.dispatch(UiEvent::EntrySelected(id.clone())),
            Dispatch::Recentered(id)
        );
        assert_eq!(c.map().last_view(), Some((Coords::new(5.0, 6.0), 13)));
    }

    #[test]
    fn selecting_an_unknown_entry_is_a_no_op() {
        let mut c = ready_controller(MemoryStore::new());
        let before = c.map().calls.len();
        assert_matches!(
            c.dispatch(UiEvent::EntrySelected(WorkoutId::new("nope"))),
            Dispatch::Ignored(_)
        );
        assert_eq!(c.map().calls.len(), before);
    }

    #[test]
    fn reset_clears_store_and_memory() {
        let kv = MemoryStore::new();
        let mut c = ready_controller(kv.clone());
        submit(&mut c, Coords::new(1.0, 1.0), FormInput::running("5", "30", "180"));
        c.dispatch(UiEvent::MapClicked(Coords::new(2.0, 2.0)));

        assert_eq!(c.dispatch(UiEvent::Reset), Dispatch::Reset);
        assert!(c.workouts().is_empty());
        assert!(kv.raw(WORKOUTS_KEY).is_none());
        assert_eq!(c.state(), ControllerState::Idle);
        assert_eq!(c.list().clears, 1);
        assert_eq!(c.map().calls.last(), Some(&MapCall::ClearMarkers));
    }

    #[test]
    fn geolocation_failure_alerts_and_keeps_running() {
        let mut c = controller_with(MemoryStore::new());
        c.on_position(Err(GeolocationUnavailableError::Unsupported));
        assert!(!c.map_ready());
        assert_eq!(c.form().alerts.len(), 1);
        assert_matches!(
            c.dispatch(UiEvent::MapClicked(Coords::new(0.0, 0.0))),
            Dispatch::Ignored(_)
        );
    }

    #[test]
    fn failed_write_keeps_workout_in_memory() {
        let kv = MemoryStore::new();
        kv.reject_writes(true);
        let mut c = ready_controller(kv.clone());
        let outcome = submit(&mut c, Coords::new(0.0, 0.0), FormInput::running("5", "30", "180"));
        assert_matches!(outcome, Dispatch::Committed(_));
        assert_eq!(c.workouts().len(), 1);
        assert!(kv.raw(WORKOUTS_KEY).is_none());
    }

    #[test]
    fn corrupt_store_starts_empty() {
        let mut kv = MemoryStore::new();
        kv.set(WORKOUTS_KEY, "[{\"broken\":").unwrap();
        let c = controller_with(kv);
        assert!(c.workouts().is_empty());
        assert!(c.list().rendered.is_empty());
    }
}
