//! Output generation.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── index.html   # today's digest, overwritten on each run with a selection
//! ```

pub mod html;
