use std::io::{BufWriter, Cursor};

use printpdf::{
    BuiltinFont, Color, Greyscale, Image, ImageTransform, IndirectFontRef, Line, LineDashPattern,
    Mm, PdfDocument, PdfLayerReference, Point,
};
use tracing::{debug, info};

use crate::barcode::CodeRenderer;
use crate::config::LabelConfig;
use crate::consts::{BORDER_DASH, BORDER_GREY, BORDER_WIDTH, MM_TO_PT};
use crate::error::{LabelError, LabelResult};
use crate::graphics::{TextFace, gray_xobject};
use crate::layout::{self, Align, Placement, Rect, SheetPlan};

const LAYER_NAME: &str = "Labels";

fn mm(pt: f32) -> Mm {
    Mm(pt / MM_TO_PT)
}

/// Composes a label sheet PDF from a configuration and raw label text.
pub struct SheetBuilder {
    config: LabelConfig,
    face: TextFace,
    title: String,
}

impl SheetBuilder {
    pub fn new(config: LabelConfig) -> Self {
        SheetBuilder {
            config,
            face: TextFace::Courier,
            title: "Labels".to_string(),
        }
    }

    /// Embed a TrueType font for label text instead of built-in Courier.
    pub fn with_font(mut self, ttf: Vec<u8>) -> LabelResult<Self> {
        self.face = TextFace::from_ttf(ttf)?;
        Ok(self)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Split `raw` into lines, expand replicates and lay the items out.
    pub fn plan(&self, raw: &str) -> LabelResult<SheetPlan> {
        let labels = layout::labels_from_text(raw);
        if labels.is_empty() {
            return Err(LabelError::NoLabels);
        }
        let items = layout::expand_replicates(&labels, self.config.replicates);
        layout::plan(&self.config, items)
    }

    /// Plan and render in one step. Returns the PDF bytes.
    pub fn build(&self, raw: &str) -> LabelResult<Vec<u8>> {
        let plan = self.plan(raw)?;
        self.render(&plan)
    }

    /// Render a plan to PDF bytes. Any code failure aborts the whole sheet.
    pub fn render(&self, plan: &SheetPlan) -> LabelResult<Vec<u8>> {
        let grid = &plan.grid;
        let (page_w, page_h) = (mm(grid.page_w), mm(grid.page_h));
        info!(
            items = plan.items.len(),
            pages = plan.pages(),
            rows = grid.rows,
            columns = grid.columns,
            code_type = %self.config.code_type,
            "Composing label sheet"
        );

        let (doc, first_page, first_layer) = PdfDocument::new(&self.title, page_w, page_h, LAYER_NAME);
        let font = match &self.face {
            TextFace::Courier => doc.add_builtin_font(BuiltinFont::Courier),
            TextFace::External { bytes, .. } => doc.add_external_font(Cursor::new(bytes.clone())),
        }
        .map_err(|e| LabelError::Pdf(e.to_string()))?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        let mut page = 0;
        let mut renderer = CodeRenderer::new(self.config.dpi);

        for (item, placement) in plan.items.iter().zip(&plan.placements) {
            if placement.slot.page != page {
                page = placement.slot.page;
                let (p, l) = doc.add_page(page_w, page_h, LAYER_NAME);
                layer = doc.get_page(p).get_layer(l);
                debug!(page, "Started page");
            }

            draw_border(&layer, grid.page_h, &placement.cell);

            let code = renderer
                .render(self.config.code_type, item)
                .map_err(|reason| LabelError::CodeGeneration { item: item.clone(), reason })?;
            draw_code(&layer, grid.page_h, &placement.code, gray_xobject(code));

            self.draw_text(&layer, &font, grid.page_h, placement, item);
        }

        let mut writer = BufWriter::new(Vec::new());
        doc.save(&mut writer).map_err(|e| LabelError::Pdf(e.to_string()))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| LabelError::Pdf(e.to_string()))?;
        info!(bytes = bytes.len(), "Label sheet ready");
        Ok(bytes)
    }

    fn draw_text(
        &self,
        layer: &PdfLayerReference,
        font: &IndirectFontRef,
        page_h: f32,
        placement: &Placement,
        item: &str,
    ) {
        let visual = self.face.visual(item);
        let anchor = placement.text;
        let x = match anchor.align {
            Align::Left => anchor.x,
            Align::Center => anchor.x - self.face.width(&visual, self.config.font_size) / 2.0,
        };
        layer.set_fill_color(Color::Greyscale(Greyscale::new(0.0, None)));
        layer.use_text(visual, self.config.font_size, mm(x), mm(page_h - anchor.baseline), font);
    }
}

fn draw_border(layer: &PdfLayerReference, page_h: f32, cell: &Rect) {
    let (top, bottom) = (page_h - cell.y, page_h - cell.y - cell.h);
    let (left, right) = (cell.x, cell.x + cell.w);
    let points = vec![
        (Point::new(mm(left), mm(top)), false),
        (Point::new(mm(right), mm(top)), false),
        (Point::new(mm(right), mm(bottom)), false),
        (Point::new(mm(left), mm(bottom)), false),
    ];

    layer.set_line_dash_pattern(LineDashPattern {
        dash_1: Some(BORDER_DASH),
        gap_1: Some(BORDER_DASH),
        ..Default::default()
    });
    layer.set_outline_color(Color::Greyscale(Greyscale::new(BORDER_GREY, None)));
    layer.set_outline_thickness(BORDER_WIDTH);
    layer.add_line(Line { points, is_closed: true });
    layer.set_line_dash_pattern(LineDashPattern::default());
}

fn draw_code(layer: &PdfLayerReference, page_h: f32, target: &Rect, xobject: printpdf::ImageXObject) {
    // dpi that stretches the raster to the target edge
    let dpi = xobject.width.0 as f32 / (target.w / 72.0);
    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(target.x)),
            translate_y: Some(mm(page_h - target.y - target.h)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}
