//! Click-to-country resolution for a spherical globe.
//!
//! A pointer ray becomes intersection candidates, [`SurfacePicker`] turns
//! the first on-sphere candidate into a geographic point, [`CountryIndex`]
//! finds the owning country (or the ocean sentinel), and `build_outline`
//! emits line-segment buffers through the same coordinate transform the
//! pick used, so the highlight always sits under the click.

pub mod containment;
pub mod index;
pub mod outline;
pub mod pick;
pub mod selection;

pub use index::*;
pub use outline::*;
pub use pick::*;
pub use selection::*;
