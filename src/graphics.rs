use ar_reshaper::{ArabicReshaper, ReshaperConfig};
use image::GrayImage;
use printpdf::{ColorBits, ColorSpace, ImageXObject, Px};
use rusttype::{Font, Scale, point};
use unicode_bidi::BidiInfo;

use crate::consts::COURIER_ADVANCE;
use crate::error::{LabelError, LabelResult};

/// Return visually ordered string: RTL runs reversed (Arabic ones reshaped
/// first), LTR runs unchanged. PDF text is drawn left to right.
fn bidi_then_shape(text: &str, reshaper: &ArabicReshaper) -> String {
    let info = BidiInfo::new(text, None);
    let Some(para) = info.paragraphs.first() else {
        return text.to_string();
    };
    let (levels, ranges) = info.visual_runs(para, para.range.clone());

    let mut out = String::new();
    for (level, range) in levels.into_iter().zip(ranges) {
        let slice = &text[range];
        if level.is_rtl() {
            if slice.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)) {
                out.extend(reshaper.reshape(slice).chars().rev());
            } else {
                out.extend(slice.chars().rev());
            }
        } else {
            out.push_str(slice);
        }
    }
    out
}

/// Face used for label text.
pub enum TextFace {
    /// Built-in PDF Courier; no embedding, Latin-1 only.
    Courier,
    /// Embedded TrueType font, measured with rusttype.
    External {
        bytes: Vec<u8>,
        font: Font<'static>,
        reshaper: ArabicReshaper,
    },
}

impl TextFace {
    pub fn from_ttf(bytes: Vec<u8>) -> LabelResult<Self> {
        let font = Font::try_from_vec(bytes.clone())
            .ok_or_else(|| LabelError::Font("not a TrueType/OpenType font".into()))?;
        Ok(TextFace::External {
            bytes,
            font,
            reshaper: ArabicReshaper::new(ReshaperConfig::default()),
        })
    }

    /// String as it should be handed to the PDF text operator.
    pub fn visual(&self, text: &str) -> String {
        match self {
            TextFace::Courier => text.to_string(),
            TextFace::External { reshaper, .. } => bidi_then_shape(text, reshaper),
        }
    }

    /// Advance width of an already visual-ordered string, in points.
    pub fn width(&self, visual: &str, font_size: f32) -> f32 {
        match self {
            TextFace::Courier => visual.chars().count() as f32 * COURIER_ADVANCE * font_size,
            TextFace::External { font, .. } => {
                // rusttype scales by ascent - descent; PDF sizes are per em
                let vm = font.v_metrics_unscaled();
                let units_per_em = f32::from(font.units_per_em());
                let height = font_size * (vm.ascent - vm.descent) / units_per_em;
                let scale = Scale::uniform(height);
                font.layout(visual, scale, point(0.0, 0.0))
                    .last()
                    .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0)
            }
        }
    }
}

/// Wrap a grayscale raster as a PDF image object.
pub fn gray_xobject(img: &GrayImage) -> ImageXObject {
    ImageXObject {
        width: Px(img.width() as usize),
        height: Px(img.height() as usize),
        color_space: ColorSpace::Greyscale,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data: img.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    }
}
