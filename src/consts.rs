// Sheet geometry and rendering constants

/// Points per millimeter.
pub const MM_TO_PT: f32 = 2.83465;

pub const A4_MM: (f32, f32) = (210.0, 297.0);
pub const LETTER_MM: (f32, f32) = (216.0, 279.0);

/// Text line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;
/// Gap between text and code, in points.
pub const TEXT_GAP: f32 = 4.0;
/// Left inset of side-placed text and its baseline nudge, in points.
pub const SIDE_TEXT_NUDGE: f32 = 2.0;

/// Code raster edge, in pixels per dpi.
pub const CODE_PX_PER_DPI: f32 = 1.2;

// Cell border
pub const BORDER_GREY: f32 = 150.0 / 255.0;
pub const BORDER_WIDTH: f32 = 0.3;
pub const BORDER_DASH: i64 = 2;

/// Courier advance width, in em.
pub const COURIER_ADVANCE: f32 = 0.6;

// Storage keys
pub const PRESETS_KEY: &str = "labelPresets";
pub const LAST_PRESET_KEY: &str = "labelLastPreset";

pub const DEFAULT_PRESET: &str = "Default";
pub const FALLBACK_PRESET_NAME: &str = "Preset";
pub const EXPORT_VERSION: u32 = 2;

pub const PDF_FILE_NAME: &str = "labels.pdf";
pub const EXPORT_FILE_NAME: &str = "label-presets.json";
pub const STORE_FILE_NAME: &str = "label-sheet-store.json";
