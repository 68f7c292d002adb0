//! Rips GoatTracker song data back out of compiled SID player binaries.
//!
//! The tracker's export packs song data into a player binary without any
//! index or markers. This crate reverses that: it locates the data through
//! the player's embedded note frequency table, works out which optional
//! player features were compiled in, and walks the packed regions back into
//! structured song data the tracker can load again.
//!
//! ```no_run
//! use sid2sng::{rip, RipOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = std::fs::read("tune.sid")?;
//! let outcome = rip(&data, &RipOptions::default())?;
//! for warning in &outcome.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! sid2sng::sng::save(&outcome.song, "tune.sng")?;
//! # Ok(())
//! # }
//! ```

pub mod detect;
pub mod error;
pub mod freq_table;
pub mod matcher;
pub mod reader;
pub mod ripper;
pub mod sid_file;
pub mod sng;
pub mod song;

pub use detect::{Features, RipOptions};
pub use error::{Result, RipError};
pub use ripper::{rip, RipOutcome, Warning};
pub use sid_file::SidHeader;
pub use song::{Instrument, Song};
