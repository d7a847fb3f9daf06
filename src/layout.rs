//! Grid geometry for a label sheet.
//!
//! All lengths are PDF points. Y grows downward from the top edge of the page;
//! the renderer flips it when drawing. Text anchors are baselines.

use crate::config::{LabelConfig, TextPosition};
use crate::consts::{LINE_HEIGHT, MM_TO_PT, SIDE_TEXT_NUDGE, TEXT_GAP};
use crate::error::{LabelError, LabelResult};

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// Split raw input into label lines: trimmed, blank lines dropped.
pub fn labels_from_text(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Repeat every item `replicates` times in a row, keeping input order.
pub fn expand_replicates(items: &[String], replicates: u32) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| std::iter::repeat(item.clone()).take(replicates as usize))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn inset(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            w: self.w - 2.0 * dx,
            h: self.h - 2.0 * dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Where a label's text goes: `x` is the left edge for `Left`, the midpoint
/// for `Center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAnchor {
    pub x: f32,
    pub baseline: f32,
    pub align: Align,
}

/// Position of a flat item index in the paginated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub page: usize,
    pub row: usize,
    pub column: usize,
}

/// Page tiling derived from a [`LabelConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub page_w: f32,
    pub page_h: f32,
    pub margin_h: f32,
    pub margin_v: f32,
    pub padding_h: f32,
    pub padding_v: f32,
    pub font_size: f32,
    pub text_height: f32,
    pub code_side: f32,
    pub cell_w: f32,
    pub cell_h: f32,
    pub columns: usize,
    pub rows: usize,
    pub text_position: TextPosition,
}

impl Grid {
    pub fn new(config: &LabelConfig) -> LabelResult<Self> {
        config.validate()?;

        let (w_mm, h_mm) = config.paper.size_mm();
        let page_w = mm_to_pt(w_mm);
        let page_h = mm_to_pt(h_mm);
        let margin_h = mm_to_pt(config.margin_h);
        let margin_v = mm_to_pt(config.margin_v);
        let padding_h = mm_to_pt(config.padding_h);
        let padding_v = mm_to_pt(config.padding_v);
        let code_side = mm_to_pt(config.code_size_mm);

        let content_w = page_w - 2.0 * margin_h;
        let content_h = page_h - 2.0 * margin_v;
        if content_w <= 0.0 {
            return Err(LabelError::InvalidConfig(
                "horizontal margins leave no room on the page".into(),
            ));
        }

        let text_height = config.font_size * LINE_HEIGHT;
        let columns = config.columns as usize;
        let cell_w = content_w / columns as f32;
        let cell_h = 2.0 * padding_v + text_height + code_side;

        let rows = (content_h / cell_h).floor();
        if !rows.is_finite() || rows <= 0.0 {
            return Err(LabelError::ZeroRows);
        }

        Ok(Grid {
            page_w,
            page_h,
            margin_h,
            margin_v,
            padding_h,
            padding_v,
            font_size: config.font_size,
            text_height,
            code_side,
            cell_w,
            cell_h,
            columns,
            rows: rows as usize,
            text_position: config.text_position,
        })
    }

    pub fn per_page(&self) -> usize {
        self.rows * self.columns
    }

    pub fn page_count(&self, items: usize) -> usize {
        items.div_ceil(self.per_page())
    }

    pub fn slot(&self, index: usize) -> Slot {
        let per_page = self.per_page();
        let on_page = index % per_page;
        Slot {
            page: index / per_page,
            row: on_page / self.columns,
            column: on_page % self.columns,
        }
    }

    pub fn cell(&self, slot: Slot) -> Rect {
        Rect {
            x: self.margin_h + slot.column as f32 * self.cell_w,
            y: self.margin_v + slot.row as f32 * self.cell_h,
            w: self.cell_w,
            h: self.cell_h,
        }
    }

    /// Lay out code square and text inside one cell.
    pub fn place(&self, index: usize) -> Placement {
        let slot = self.slot(index);
        let cell = self.cell(slot);
        let inner = cell.inset(self.padding_h, self.padding_v);
        let side = self.code_side;
        let side_baseline = inner.y + inner.h / 2.0 + self.font_size / 2.0 - SIDE_TEXT_NUDGE;

        let (code, text) = match self.text_position {
            TextPosition::Top => {
                let baseline = inner.y + self.text_height;
                (
                    Rect { x: inner.x + inner.w / 2.0 - side / 2.0, y: baseline + TEXT_GAP, w: side, h: side },
                    TextAnchor { x: inner.x + inner.w / 2.0, baseline, align: Align::Center },
                )
            }
            TextPosition::Bottom => (
                Rect { x: inner.x + inner.w / 2.0 - side / 2.0, y: inner.y, w: side, h: side },
                TextAnchor {
                    x: inner.x + inner.w / 2.0,
                    baseline: inner.y + inner.h - TEXT_GAP,
                    align: Align::Center,
                },
            ),
            TextPosition::Left => (
                Rect { x: inner.x + inner.w - side, y: inner.y + (inner.h - side) / 2.0, w: side, h: side },
                TextAnchor { x: inner.x + SIDE_TEXT_NUDGE, baseline: side_baseline, align: Align::Left },
            ),
            TextPosition::Right => (
                Rect { x: inner.x, y: inner.y + (inner.h - side) / 2.0, w: side, h: side },
                TextAnchor { x: inner.x + side + TEXT_GAP, baseline: side_baseline, align: Align::Left },
            ),
        };

        Placement { index, slot, cell, code, text }
    }
}

/// Geometry of one label on the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub slot: Slot,
    pub cell: Rect,
    pub code: Rect,
    pub text: TextAnchor,
}

/// Full layout for a batch of already expanded items.
#[derive(Debug, Clone)]
pub struct SheetPlan {
    pub grid: Grid,
    pub items: Vec<String>,
    pub placements: Vec<Placement>,
}

impl SheetPlan {
    pub fn pages(&self) -> usize {
        self.grid.page_count(self.items.len())
    }
}

/// Compute the layout for `items` without rendering anything.
pub fn plan(config: &LabelConfig, items: Vec<String>) -> LabelResult<SheetPlan> {
    if items.is_empty() {
        return Err(LabelError::NoLabels);
    }
    let grid = Grid::new(config)?;
    let placements = (0..items.len()).map(|i| grid.place(i)).collect();
    Ok(SheetPlan { grid, items, placements })
}
