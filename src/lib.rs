//! Printable label sheets with DataMatrix / QR codes.
//! - Tiles A4 or Letter pages into a grid of dashed label cells
//! - Each label carries its text and a code, text on any side of the code
//! - Replicates repeat every input line as consecutive labels
//! - Named presets persist in a key-value store and move as JSON files
//!
//! ```ignore
//! use label_sheet::{LabelConfig, SheetBuilder};
//!
//! let pdf = SheetBuilder::new(LabelConfig::default()).build("S-001\nS-002")?;
//! std::fs::write("labels.pdf", pdf)?;
//! ```

pub mod barcode;
pub mod builder;
pub mod config;
pub mod consts;
pub mod error;
pub mod graphics;
pub mod layout;
pub mod presets;
pub mod store;

pub use builder::SheetBuilder;
pub use config::{CodeType, LabelConfig, Paper, TextPosition};
pub use error::{LabelError, LabelResult};
pub use layout::{Grid, Placement, SheetPlan, plan};
pub use presets::{Preset, PresetCollection, PresetStore};
pub use store::{FileStore, KeyValueStore, MemoryStore};
