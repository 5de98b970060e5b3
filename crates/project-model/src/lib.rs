//! Reelcut Project Model
//!
//! Defines the core data contracts for Reelcut editing sessions:
//! - **Clips:** Trimmed source media placed on a track of the timeline clock
//! - **Overlays:** Text and image annotations with absolute timeline windows
//! - **Timeline:** The insertion-ordered clip collection and its CRUD surface
//! - **Export:** Output container/codec vocabulary chosen once per export
//!
//! All times are seconds on the single global timeline clock unless a name
//! says otherwise (`in_secs`/`out_secs` are source-relative).

pub mod clip;
pub mod export;
pub mod overlay;
pub mod timeline;

pub use clip::*;
pub use export::*;
pub use overlay::*;
pub use timeline::*;
