//! Thematic map of renter housing cost burden.
//!
//! Layers are loaded from GeoJSON in the background, classified into
//! draw styles, and shown or hidden by a visibility coordinator that
//! combines the user's legend checkboxes with per-layer zoom gates.

pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod legend;
pub mod map;
pub mod popup;
pub mod session;
pub mod style;
pub mod visibility;
