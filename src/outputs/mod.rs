//! Local output of run results.
//!
//! # Submodules
//!
//! - [`json`]: Writes the run's summary records to a dated JSON archive
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 061502.json
//!     └── 180011.json
//! ```

pub mod json;
