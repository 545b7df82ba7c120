//! Per-subtitle-format track state machines (spec §3/§4.D/§4.E). The
//! dispatcher holds one of each as separate `Option` fields (`bitmap_track`,
//! `text_track`) rather than a unifying sum type, since a given filter
//! instance is built for exactly one family and never switches.

pub mod bitmap;
pub mod text;
