//! Application state and the transitions the terminal shell dispatches into.
//!
//! Nothing here touches the terminal, so every user intent can be exercised
//! against a fake playback engine.

use crate::catalog::{self, Catalog, DEFAULT_GROUP};
use crate::error::FetchError;
use crate::player::{PlaybackController, PlaybackEngine, PlaybackState};
use crate::station::Station;

const VOLUME_STEP: f32 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    NextGroup,
    PreviousGroup,
    CursorUp,
    CursorDown,
    PlayCursor,
    TogglePause,
    Next,
    Previous,
    ToggleSearch,
    QueryPush(char),
    QueryPop,
    VolumeUp,
    VolumeDown,
    Mute,
}

pub struct AppState<E: PlaybackEngine> {
    pub catalog: Catalog,
    pub player: PlaybackController<E>,
    pub loading: bool,
    pub search_open: bool,
    pub query: String,
    /// Row in the filtered grid, not an index into the group.
    pub cursor: usize,
    /// Last playback failure, shown until the next successful action.
    pub status: Option<String>,
    saved_volume: Option<f32>,
}

impl<E: PlaybackEngine> AppState<E> {
    pub fn new(player: PlaybackController<E>) -> Self {
        Self {
            catalog: Catalog::default(),
            player,
            loading: true,
            search_open: false,
            query: String::new(),
            cursor: 0,
            status: None,
            saved_volume: None,
        }
    }

    /// Ends the loading phase. A failed fetch leaves an empty catalog.
    pub fn load(&mut self, fetched: Result<Vec<Station>, FetchError>) {
        let stations = fetched.unwrap_or_else(|e| {
            tracing::warn!("error fetching radio stations: {}", e);
            Vec::new()
        });
        self.catalog = Catalog::group(stations);
        self.loading = false;
        self.cursor = 0;
    }

    pub fn selected_group(&self) -> &str {
        &self.player.selection().group
    }

    /// Stations visible in the grid with their index in the selected group.
    pub fn rows(&self) -> Vec<(usize, &Station)> {
        let stations = self.catalog.stations(self.selected_group());
        catalog::matching_indices(stations, &self.query)
            .into_iter()
            .map(|i| (i, &stations[i]))
            .collect()
    }

    pub fn is_playing_station(&self, station: &Station) -> bool {
        self.player
            .now_playing()
            .map_or(false, |(s, _)| s.id == station.id)
    }

    pub fn show_transport(&self) -> bool {
        self.player.state() != PlaybackState::Idle
    }

    pub fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::NextGroup => self.step_group(1),
            Intent::PreviousGroup => self.step_group(-1),
            Intent::CursorUp => self.cursor = self.cursor.saturating_sub(1),
            Intent::CursorDown => {
                let rows = self.rows().len();
                if self.cursor + 1 < rows {
                    self.cursor += 1;
                }
            }
            Intent::PlayCursor => {
                let picked = self.rows().get(self.cursor).map(|(i, _)| *i);
                if let Some(index) = picked {
                    let group = self.selected_group().to_string();
                    let result = self.player.select_station(&self.catalog, &group, index);
                    self.report(result);
                }
            }
            Intent::TogglePause => self.player.toggle(),
            Intent::Next => {
                if self.show_transport() {
                    let result = self.player.next(&self.catalog);
                    self.report(result);
                }
            }
            Intent::Previous => {
                if self.show_transport() {
                    let result = self.player.previous(&self.catalog);
                    self.report(result);
                }
            }
            Intent::ToggleSearch => self.search_open = !self.search_open,
            Intent::QueryPush(c) => {
                self.query.push(c);
                self.cursor = 0;
            }
            Intent::QueryPop => {
                self.query.pop();
                self.cursor = 0;
            }
            Intent::VolumeUp => self.player.set_volume(self.player.volume() + VOLUME_STEP),
            Intent::VolumeDown => self.player.set_volume(self.player.volume() - VOLUME_STEP),
            Intent::Mute => {
                let current = self.player.volume();
                if current > 0.0 {
                    self.saved_volume = Some(current);
                    self.player.set_volume(0.0);
                } else {
                    let restore = self.saved_volume.take().unwrap_or(0.5);
                    self.player.set_volume(restore);
                }
            }
        }
    }

    fn step_group(&mut self, delta: isize) {
        let count = self.catalog.groups().len();
        if count == 0 {
            return;
        }
        let next = match self.catalog.position(self.selected_group()) {
            Some(pos) => (pos as isize + delta).rem_euclid(count as isize) as usize,
            None if delta < 0 => count - 1,
            None => 0,
        };
        let name = self.catalog.groups()[next].name.clone();
        self.player.select_group(&name);
        self.cursor = 0;
    }

    fn report(&mut self, result: Result<(), crate::error::PlaybackError>) {
        self.status = result.err().map(|e| e.to_string());
    }
}

/// Group shown before the user picks a tab.
pub fn initial_group() -> &'static str {
    DEFAULT_GROUP
}
