//! MIDI file output for generated step sequences
//!
//! Sequences are appended to one track; each step lasts `480 / subdivision`
//! ticks and every onset becomes a note that lasts exactly one step.

use std::path::Path;

use eucmorph_core::StepSequence;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use thiserror::Error;
use tracing::info;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_BEAT: u16 = 480;

const DEFAULT_TEMPO: u32 = 120;
const DEFAULT_SUBDIVISION: u32 = 4;
const NOTE_OFF_VELOCITY: u8 = 64;

#[derive(Debug, Error)]
pub enum MidiWriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Subdivision {0} does not fit 480 ticks per beat")]
    InvalidSubdivision(u32),
    #[error("Tempo {0} BPM is outside the MIDI tempo range")]
    InvalidTempo(u32),
    #[error("Note {0} is outside the MIDI range 0-127")]
    InvalidNote(u8),
    #[error("Velocity {0} is outside the MIDI range 0-127")]
    InvalidVelocity(u8),
}

pub type Result<T> = std::result::Result<T, MidiWriterError>;

/// Accumulates step sequences into a single-track MIDI file
#[derive(Debug, Clone)]
pub struct MidiWriter {
    events: Track<'static>,
    tempo: u32,
    subdivision: u32,
    /// Ticks per step
    timestep: u32,
    /// Rest ticks since the last event
    timer: u32,
    channel: u4,
}

impl Default for MidiWriter {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            tempo: DEFAULT_TEMPO,
            subdivision: DEFAULT_SUBDIVISION,
            timestep: TICKS_PER_BEAT as u32 / DEFAULT_SUBDIVISION,
            timer: 0,
            channel: u4::new(0),
        }
    }
}

impl MidiWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write notes on `channel` (0-15; GM drums are on 9)
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = u4::new(channel.min(15));
        self
    }

    /// Append a sequence after everything added so far.
    ///
    /// The sequence is validated first; on error nothing is written.
    pub fn add(&mut self, seq: &StepSequence) -> Result<()> {
        let subdivision = seq.subdivision();
        if subdivision == 0 || subdivision > TICKS_PER_BEAT as u32 {
            return Err(MidiWriterError::InvalidSubdivision(subdivision));
        }
        let tempo = tempo_micros(seq.tempo()).ok_or(MidiWriterError::InvalidTempo(seq.tempo()))?;
        let key = u7::try_from(seq.note()).ok_or(MidiWriterError::InvalidNote(seq.note()))?;
        if let Some(step) = seq.steps().iter().find(|s| s.onset && s.velocity > 127) {
            return Err(MidiWriterError::InvalidVelocity(step.velocity));
        }

        if seq.tempo() != self.tempo {
            self.tempo = seq.tempo();
            self.push(0, TrackEventKind::Meta(MetaMessage::Tempo(tempo)));
        }
        if subdivision != self.subdivision {
            self.subdivision = subdivision;
            self.timestep = TICKS_PER_BEAT as u32 / subdivision;
        }

        for step in seq.steps() {
            if step.onset {
                let vel = u7::new(step.velocity);
                self.push(self.timer, self.midi(MidiMessage::NoteOn { key, vel }));
                let vel = u7::new(NOTE_OFF_VELOCITY);
                self.push(self.timestep, self.midi(MidiMessage::NoteOff { key, vel }));
                self.timer = 0;
            } else {
                self.timer += self.timestep;
            }
        }
        Ok(())
    }

    fn midi(&self, message: MidiMessage) -> TrackEventKind<'static> {
        TrackEventKind::Midi { channel: self.channel, message }
    }

    fn push(&mut self, delta: u32, kind: TrackEventKind<'static>) {
        self.events.push(TrackEvent { delta: u28::new(delta.min(0x0FFF_FFFF)), kind });
    }

    /// Events added so far, without the closing end-of-track
    pub fn events(&self) -> &[TrackEvent<'static>] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop everything written so far
    pub fn clear(&mut self) {
        *self = Self::new().with_channel(self.channel.as_int());
    }

    /// Build the file; trailing rests become the end-of-track delta
    pub fn to_smf(&self) -> Smf<'static> {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_BEAT)),
        ));
        let mut track = self.events.clone();
        track.push(TrackEvent {
            delta: u28::new(self.timer.min(0x0FFF_FFFF)),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
        smf
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.to_smf().write_std(&mut buf)?;
        Ok(buf)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        info!("Saved {} MIDI events to {}", self.events.len(), path.display());
        Ok(())
    }

    /// One line per event, for logs
    pub fn describe(&self) -> Vec<String> {
        self.to_smf().tracks[0]
            .iter()
            .map(|e| format!("{:>6} {:?}", e.delta.as_int(), e.kind))
            .collect()
    }
}

/// Microseconds per beat, or `None` when `bpm` is 0 or too slow for the
/// 24-bit tempo field (below about 3.6 BPM)
fn tempo_micros(bpm: u32) -> Option<u24> {
    let micros = 60_000_000u32.checked_div(bpm)?;
    u24::try_from(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(pattern: &[u8]) -> StepSequence {
        StepSequence::from_pattern(&pattern.iter().map(|&b| b == 1).collect::<Vec<_>>())
    }

    fn note_on(event: &TrackEvent) -> Option<(u8, u8)> {
        match event.kind {
            TrackEventKind::Midi { message: MidiMessage::NoteOn { key, vel }, .. } => {
                Some((key.as_int(), vel.as_int()))
            }
            _ => None,
        }
    }

    #[test]
    fn test_note_timing() {
        let mut writer = MidiWriter::new();
        writer.add(&seq(&[1, 0, 0, 1])).unwrap();

        let events = writer.events();
        // Default tempo: no tempo event
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].delta.as_int(), 0);
        assert_eq!(note_on(&events[0]), Some((36, 100)));
        assert_eq!(events[1].delta.as_int(), 120);
        // Two rests between the notes
        assert_eq!(events[2].delta.as_int(), 240);
        assert!(note_on(&events[2]).is_some());
    }

    #[test]
    fn test_rests_carry_across_sequences() {
        let mut writer = MidiWriter::new();
        writer.add(&seq(&[1, 0, 0])).unwrap();
        writer.add(&seq(&[0, 1])).unwrap();

        let events = writer.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[2].delta.as_int(), 360);

        let smf = writer.to_smf();
        let last = smf.tracks[0].last().unwrap();
        assert_eq!(last.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack));
        assert_eq!(last.delta.as_int(), 0);
    }

    #[test]
    fn test_trailing_rests_in_end_of_track() {
        let mut writer = MidiWriter::new();
        writer.add(&seq(&[1, 0, 0, 0])).unwrap();
        let smf = writer.to_smf();
        assert_eq!(smf.tracks[0].last().unwrap().delta.as_int(), 360);
    }

    #[test]
    fn test_tempo_and_subdivision_changes() {
        let mut writer = MidiWriter::new();
        let fast = seq(&[1, 1]).with_tempo(150).with_subdivision(2).with_note(42);
        writer.add(&fast).unwrap();

        let events = writer.events();
        assert_eq!(events[0].kind, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(400_000))));
        assert_eq!(note_on(&events[1]), Some((42, 100)));
        assert_eq!(events[2].delta.as_int(), 240);

        // Same tempo again: no second tempo event
        writer.add(&fast).unwrap();
        let tempo_events = writer
            .events()
            .iter()
            .filter(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Tempo(_))))
            .count();
        assert_eq!(tempo_events, 1);
    }

    #[test]
    fn test_invalid_subdivision() {
        let mut writer = MidiWriter::new();
        let seq = seq(&[1]).with_subdivision(960);
        assert!(matches!(writer.add(&seq), Err(MidiWriterError::InvalidSubdivision(960))));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_out_of_range_note_and_velocity() {
        let mut writer = MidiWriter::new();
        let high_note = seq(&[1]).with_note(200);
        assert!(matches!(writer.add(&high_note), Err(MidiWriterError::InvalidNote(200))));
        assert!(writer.is_empty());

        let mut loud = seq(&[1, 0]);
        loud.set_step(1, Some(128)).unwrap();
        assert!(matches!(writer.add(&loud), Err(MidiWriterError::InvalidVelocity(128))));
        assert!(writer.is_empty());

        // Velocity on a rest is never written
        let mut trailing_rest = seq(&[1, 0]);
        trailing_rest.push(false, Some(200));
        writer.add(&trailing_rest).unwrap();
        assert_eq!(note_on(&writer.events()[0]), Some((36, 100)));

        let mut top = seq(&[1]).with_note(127);
        top.set_step(0, Some(127)).unwrap();
        writer.add(&top).unwrap();
        assert_eq!(note_on(&writer.events()[2]), Some((127, 127)));
    }

    #[test]
    fn test_tempo_out_of_range() {
        let mut writer = MidiWriter::new();
        let slow = seq(&[1]).with_tempo(3).with_subdivision(2);
        assert!(matches!(writer.add(&slow), Err(MidiWriterError::InvalidTempo(3))));
        assert!(writer.is_empty());

        // 4 BPM is the slowest tempo the 24-bit field holds
        writer.add(&seq(&[1]).with_tempo(4)).unwrap();
        assert_eq!(
            writer.events()[0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(15_000_000)))
        );
        assert_eq!(tempo_micros(0), None);
    }

    #[test]
    fn test_bytes_parse_back() {
        let mut writer = MidiWriter::new().with_channel(9);
        writer.add(&seq(&[1, 0, 1, 0])).unwrap();
        let bytes = writer.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0].len(), writer.event_count() + 1);
        match smf.tracks[0][0].kind {
            TrackEventKind::Midi { channel, .. } => assert_eq!(channel.as_int(), 9),
            ref other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_clear() {
        let mut writer = MidiWriter::new().with_channel(3);
        writer.add(&seq(&[1, 0]).with_tempo(90)).unwrap();
        writer.clear();
        assert!(writer.is_empty());
        assert_eq!(writer.describe().len(), 1);

        // Tempo state is back to the default, so 90 BPM is announced again
        writer.add(&seq(&[1]).with_tempo(90)).unwrap();
        assert!(matches!(writer.events()[0].kind, TrackEventKind::Meta(MetaMessage::Tempo(_))));
    }
}
