use clap::ValueEnum;

/// The one string this tool stamps.
pub const STAMP_TEXT: &str = "Made In China";

/// Canonical font size in points.
pub const DEFAULT_FONT_SIZE: f64 = 8.0;

/// Baseline distance from the bottom edge, as a multiple of the font size.
pub const DEFAULT_OFFSET_FACTOR: f64 = 1.0;

/// How a selection of files is taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntakeMode {
    /// Only the first file is considered; an invalid file aborts the run.
    Single,
    /// Every file is considered; invalid files are skipped one by one.
    Batch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StampParams {
    pub font_size: f64,
    /// baseline y = font_size * offset_factor
    pub offset_factor: f64,
}

impl Default for StampParams {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            offset_factor: DEFAULT_OFFSET_FACTOR,
        }
    }
}

/// Page box in PDF user space (lower-left / upper-right corners).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// Where the stamp baseline starts on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub text_width: f64,
}

// Helvetica (WinAnsi, 32..126) widths in 1/1000 em
const HELV_W_32_126: [i16; 95] = [
    278,278,355,556,556,889,667,191,333,333,389,584,278,333,278,278,
    556,556,556,556,556,556,556,556,556,556,278,278,584,584,584,556,
    1015,667,667,722,722,667,611,778,722,278,500,667,556,833,722,778,
    667,778,722,667,611,722,667,944,667,667,611,278,278,278,469,556,
    333,556,556,500,556,556,278,556,556,222,222,500,222,833,556,556,
    556,556,333,500,278,556,500,722,500,500,500,334,260,334,584,
];

/// Advance width of `text` set in Helvetica at `font_size` points.
///
/// Bytes outside printable ASCII fall back to a 600/1000 em advance.
pub fn helvetica_text_width(text: &str, font_size: f64) -> f64 {
    let w1000: f64 = text
        .bytes()
        .map(|b| {
            if (32..=126).contains(&b) {
                HELV_W_32_126[(b - 32) as usize] as f64
            } else {
                600.0
            }
        })
        .sum();
    w1000 * font_size / 1000.0
}

impl StampParams {
    pub fn text_width(&self) -> f64 {
        helvetica_text_width(STAMP_TEXT, self.font_size)
    }

    /// Horizontally centered, just above the bottom edge of `page`.
    ///
    /// Pages narrower than the text get a negative offset from `llx`: the text
    /// overflows both edges by the same amount and is not clipped or scaled.
    pub fn placement(&self, page: &PageBox) -> Placement {
        let text_width = self.text_width();
        Placement {
            x: page.llx + (page.width() - text_width) / 2.0,
            y: page.lly + self.font_size * self.offset_factor,
            text_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter() -> PageBox {
        PageBox { llx: 0.0, lly: 0.0, urx: 612.0, ury: 792.0 }
    }

    #[test]
    fn stamp_text_width_at_canonical_size() {
        // 6503/1000 em at 8pt
        let w = StampParams::default().text_width();
        assert!((w - 52.024).abs() < 1e-9, "got {w}");
    }

    #[test]
    fn placement_is_centered_near_bottom() {
        let params = StampParams::default();
        let p = params.placement(&letter());
        assert!((p.x - (612.0 - 52.024) / 2.0).abs() < 1e-9);
        assert_eq!(p.y, 8.0);
        assert!(p.x >= 0.0 && p.x <= 612.0 - p.text_width);
    }

    #[test]
    fn placement_respects_offset_factor_and_box_origin() {
        let params = StampParams { font_size: 6.0, offset_factor: 1.5 };
        let page = PageBox { llx: 10.0, lly: 20.0, urx: 110.0, ury: 220.0 };
        let p = params.placement(&page);
        assert_eq!(p.y, 20.0 + 9.0);
        assert!((p.x - (10.0 + (100.0 - p.text_width) / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn narrow_page_overflows_symmetrically() {
        let params = StampParams::default();
        let page = PageBox { llx: 0.0, lly: 0.0, urx: 40.0, ury: 40.0 };
        let p = params.placement(&page);
        assert!(p.x < 0.0);
        let right_overflow = p.x + p.text_width - page.width();
        assert!((right_overflow + p.x).abs() < 1e-9);
    }

    #[test]
    fn non_ascii_falls_back_to_default_advance() {
        assert_eq!(helvetica_text_width("\u{e9}", 10.0), 12.0);
    }
}
