//! Terminal player for the stations a radio directory lists for one country.
//!
//! Stations are fetched once, grouped by language into a [`catalog::Catalog`],
//! narrowed by [`catalog::filter`] and played through a
//! [`player::PlaybackController`] that never holds more than one session.

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod player;
pub mod station;
pub mod ui;
