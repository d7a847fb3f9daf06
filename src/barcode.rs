use datamatrix::{DataMatrix, SymbolList};
use image::{GrayImage, Luma};
use qrcode::QrCode;

use crate::config::CodeType;
use crate::consts::CODE_PX_PER_DPI;

/// Module grid of an encoded symbol, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modules {
    pub width: usize,
    pub height: usize,
    pub dark: Vec<bool>,
}

impl Modules {
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }
}

/// Encode `text` as a DataMatrix or QR module grid (no quiet zone).
pub fn encode(code_type: CodeType, text: &str) -> Result<Modules, String> {
    match code_type {
        CodeType::Datamatrix => {
            let bitmap = DataMatrix::encode(text.as_bytes(), SymbolList::default().enforce_square())
                .map_err(|e| format!("{:?}", e))?
                .bitmap();
            let (width, height) = (bitmap.width(), bitmap.height());
            let mut dark = vec![false; width * height];
            for (x, y) in bitmap.pixels() {
                dark[y * width + x] = true;
            }
            Ok(Modules { width, height, dark })
        }
        CodeType::Qrcode => {
            let code = QrCode::new(text.as_bytes()).map_err(|e| e.to_string())?;
            let width = code.width();
            let dark = code
                .to_colors()
                .into_iter()
                .map(|c| c == qrcode::Color::Dark)
                .collect();
            Ok(Modules { width, height: width, dark })
        }
    }
}

/// Rasterizes codes into one reused scratch surface.
///
/// The target edge is `dpi * 1.2` pixels; modules are drawn as whole-pixel
/// squares so the symbol stays crisp, so the surface edge is the largest
/// multiple of the module count that fits (at least one pixel per module).
pub struct CodeRenderer {
    target_px: u32,
    surface: GrayImage,
}

impl CodeRenderer {
    pub fn new(dpi: u32) -> Self {
        let target_px = ((dpi as f32 * CODE_PX_PER_DPI).round() as u32).max(1);
        CodeRenderer {
            target_px,
            surface: GrayImage::new(0, 0),
        }
    }

    pub fn target_px(&self) -> u32 {
        self.target_px
    }

    /// Draw `modules` onto the scratch surface and return it.
    pub fn rasterize(&mut self, modules: &Modules) -> &GrayImage {
        let longest = modules.width.max(modules.height).max(1) as u32;
        let scale = (self.target_px / longest).max(1);
        let w = modules.width as u32 * scale;
        let h = modules.height as u32 * scale;

        if self.surface.dimensions() != (w, h) {
            self.surface = GrayImage::from_pixel(w, h, Luma([255]));
        } else {
            for p in self.surface.pixels_mut() {
                *p = Luma([255]);
            }
        }

        for my in 0..modules.height {
            for mx in 0..modules.width {
                if !modules.is_dark(mx, my) {
                    continue;
                }
                let (x0, y0) = (mx as u32 * scale, my as u32 * scale);
                for y in y0..y0 + scale {
                    for x in x0..x0 + scale {
                        self.surface.put_pixel(x, y, Luma([0]));
                    }
                }
            }
        }
        &self.surface
    }

    /// Encode and rasterize in one step.
    pub fn render(&mut self, code_type: CodeType, text: &str) -> Result<&GrayImage, String> {
        let modules = encode(code_type, text)?;
        Ok(self.rasterize(&modules))
    }
}
