use crate::catalog::Catalog;
use crate::error::PlaybackError;
use crate::station::Station;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const CHANNELS: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionOptions {
    /// Live stream: let the decoder reconnect when the server drops us.
    pub stream: bool,
    pub volume: f32,
}

/// A live binding to one stream. Dropping a session must release it.
pub trait Session {
    fn play(&mut self);
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn unload(&mut self);
}

pub trait PlaybackEngine {
    type Session: Session;

    /// Starts retrieving and decoding `url`. The session comes back paused.
    fn create(&mut self, url: &str, options: &SessionOptions)
        -> Result<Self::Session, PlaybackError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Which group the user is looking at, and which of its stations is current.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub group: String,
    pub index: Option<usize>,
}

struct Active<S> {
    session: S,
    station: Station,
    group: String,
    paused: bool,
}

/// Owns at most one session. Acquiring a new one always releases the old
/// one first.
pub struct PlaybackController<E: PlaybackEngine> {
    engine: E,
    options: SessionOptions,
    selection: Selection,
    active: Option<Active<E::Session>>,
}

impl<E: PlaybackEngine> PlaybackController<E> {
    pub fn new(engine: E, options: SessionOptions, group: impl Into<String>) -> Self {
        Self {
            engine,
            options,
            selection: Selection {
                group: group.into(),
                index: None,
            },
            active: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match &self.active {
            None => PlaybackState::Idle,
            Some(a) if a.paused => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Station bound to the live session, with the group it was chosen from.
    pub fn now_playing(&self) -> Option<(&Station, &str)> {
        self.active.as_ref().map(|a| (&a.station, a.group.as_str()))
    }

    pub fn volume(&self) -> f32 {
        self.options.volume
    }

    /// Switching groups forgets the index; the current session keeps playing.
    pub fn select_group(&mut self, group: &str) {
        if self.selection.group != group {
            self.selection = Selection {
                group: group.to_string(),
                index: None,
            };
        }
    }

    /// Panics if `index` is out of range for `group`: callers only pass
    /// indices taken from the rendered list.
    pub fn select_station(
        &mut self,
        catalog: &Catalog,
        group: &str,
        index: usize,
    ) -> Result<(), PlaybackError> {
        let stations = catalog.stations(group);
        assert!(
            index < stations.len(),
            "station index {} out of range for group {:?} ({} stations)",
            index,
            group,
            stations.len()
        );
        let station = stations[index].clone();

        self.selection = Selection {
            group: group.to_string(),
            index: Some(index),
        };
        self.release();

        tracing::info!("playing {:?} ({}) from {}", station.name, station.url, group);
        let mut session = self.engine.create(&station.url, &self.options).map_err(|e| {
            tracing::warn!("could not start {:?}: {}", station.name, e);
            e
        })?;
        session.play();

        self.active = Some(Active {
            session,
            station,
            group: group.to_string(),
            paused: false,
        });
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(a) = self.active.as_mut().filter(|a| !a.paused) {
            a.session.pause();
            a.paused = true;
            tracing::debug!("paused {:?}", a.station.name);
        }
    }

    pub fn resume(&mut self) {
        if let Some(a) = self.active.as_mut().filter(|a| a.paused) {
            a.session.play();
            a.paused = false;
            tracing::debug!("resumed {:?}", a.station.name);
        }
    }

    pub fn toggle(&mut self) {
        match self.state() {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle => {}
        }
    }

    /// No-op on an empty group.
    pub fn next(&mut self, catalog: &Catalog) -> Result<(), PlaybackError> {
        let len = catalog.stations(&self.selection.group).len();
        match next_index(self.selection.index, len) {
            Some(i) => {
                let group = self.selection.group.clone();
                self.select_station(catalog, &group, i)
            }
            None => Ok(()),
        }
    }

    /// No-op on an empty group.
    pub fn previous(&mut self, catalog: &Catalog) -> Result<(), PlaybackError> {
        let len = catalog.stations(&self.selection.group).len();
        match previous_index(self.selection.index, len) {
            Some(i) => {
                let group = self.selection.group.clone();
                self.select_station(catalog, &group, i)
            }
            None => Ok(()),
        }
    }

    /// Applies to the live session and to every session created later.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.options.volume = volume;
        if let Some(a) = self.active.as_mut() {
            a.session.set_volume(volume);
        }
    }

    /// Stops and frees the live session, if any.
    pub fn release(&mut self) {
        if let Some(mut a) = self.active.take() {
            tracing::debug!("releasing session for {:?}", a.station.name);
            a.session.unload();
        }
    }
}

pub fn next_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i + 1) % len,
        None => 0,
    })
}

pub fn previous_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i % len + len - 1) % len,
        None => len - 1,
    })
}

/// Decodes with an ffmpeg child process and plays PCM through rodio.
/// The output device is opened on first use.
#[derive(Default)]
pub struct RodioEngine {
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&OutputStreamHandle, PlaybackError> {
        if self.output.is_none() {
            let pair =
                OutputStream::try_default().map_err(|e| PlaybackError::Output(e.to_string()))?;
            self.output = Some(pair);
        }
        match &self.output {
            Some((_, handle)) => Ok(handle),
            None => Err(PlaybackError::Output("no output stream".to_string())),
        }
    }
}

impl PlaybackEngine for RodioEngine {
    type Session = FfmpegSession;

    fn create(&mut self, url: &str, options: &SessionOptions) -> Result<FfmpegSession, PlaybackError> {
        let sink = Sink::try_new(self.handle()?).map_err(|e| PlaybackError::Sink(e.to_string()))?;
        sink.pause();
        sink.set_volume(options.volume);

        let mut cmd = Command::new("ffmpeg");
        if options.stream {
            cmd.args(["-reconnect", "1", "-reconnect_streamed", "1"])
                .args(["-reconnect_delay_max", "5"]);
        }
        let mut child = cmd
            .arg("-i")
            .arg(url)
            .args(["-f", "s16le", "-acodec", "pcm_s16le"])
            .args(["-ar", "44100", "-ac", "2"])
            .args(["-hide_banner", "-loglevel", "error", "-"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = match child.stdout.take() {
            Some(out) => out,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PlaybackError::DecoderStdout);
            }
        };

        let (tx, rx) = mpsc::sync_channel::<Vec<i16>>(10);
        thread::spawn(move || pump_pcm(stdout, tx));

        sink.append(PcmSource::new(rx, CHANNELS, SAMPLE_RATE));

        Ok(FfmpegSession {
            child: Some(child),
            sink,
        })
    }
}

/// Reads interleaved s16le from the decoder until it exits or the session
/// goes away.
fn pump_pcm(stdout: impl Read, tx: mpsc::SyncSender<Vec<i16>>) {
    let mut reader = BufReader::new(stdout);
    let mut buf = [0u8; 8192];
    let mut carry: Option<u8> = None;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        let mut bytes = buf[..n].iter().copied();
        let mut samples = Vec::with_capacity(n / 2 + 1);
        if let Some(lo) = carry.take() {
            if let Some(hi) = bytes.next() {
                samples.push(i16::from_le_bytes([lo, hi]));
            }
        }
        while let Some(lo) = bytes.next() {
            match bytes.next() {
                Some(hi) => samples.push(i16::from_le_bytes([lo, hi])),
                None => carry = Some(lo),
            }
        }

        if tx.send(samples).is_err() {
            break;
        }
    }
}

pub struct FfmpegSession {
    child: Option<Child>,
    sink: Sink,
}

impl Session for FfmpegSession {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn unload(&mut self) {
        self.sink.stop();
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        self.unload();
    }
}

struct PcmSource {
    rx: mpsc::Receiver<Vec<i16>>,
    buffer: VecDeque<i16>,
    channels: u16,
    sample_rate: u32,
}

impl PcmSource {
    fn new(rx: mpsc::Receiver<Vec<i16>>, channels: u16, sample_rate: u32) -> Self {
        Self {
            rx,
            buffer: VecDeque::with_capacity(8192),
            channels,
            sample_rate,
        }
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Some(s) = self.buffer.pop_front() {
            return Some(s as f32 / 32768.0);
        }

        // Underrun: wait briefly, then emit silence so the sink keeps going.
        match self.rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                self.buffer.extend(chunk);
                Some(self.buffer.pop_front().map_or(0.0, |s| s as f32 / 32768.0))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Some(0.0),
            Err(mpsc::RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Source for PcmSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }
    fn channels(&self) -> u16 {
        self.channels
    }
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn total_duration(&self) -> Option<Duration> {
        None // live stream
    }
}
