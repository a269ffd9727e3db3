//! eucmorph-services: MIDI rendering for generated rhythms

pub mod midi_writer;

pub use midi_writer::{MidiWriter, MidiWriterError, TICKS_PER_BEAT};
