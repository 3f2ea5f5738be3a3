//! Couple card compositing.
//!
//! Produces the 800x400 card: two 300x300 avatars on a tinted background
//! with a title line, PNG-encoded, plus the chat caption.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontArc, FontRef, FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_ellipse_mut, draw_text_mut, text_size};
use tracing::{info, warn};

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 400;
pub const AVATAR_SIZE: u32 = 300;

/// Anchor points for the two avatars, left and right half of the canvas.
const LEFT_ANCHOR: (i64, i64) = (50, 50);
const RIGHT_ANCHOR: (i64, i64) = (450, 50);

const PREFERRED_BG: Rgba<u8> = Rgba([255, 200, 200, 255]);
const RANDOM_BG: Rgba<u8> = Rgba([200, 220, 255, 255]);
const TITLE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TITLE_SIZE: f32 = 50.0;

const FALLBACK_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Well-known truetype locations tried before the embedded fallback.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// Finished card, ready for delivery. Never mutated after creation.
pub struct CoupleCard {
    /// PNG-encoded canvas.
    pub png: Vec<u8>,
    pub caption: String,
}

#[derive(Debug)]
pub enum CardError {
    /// PNG encoding of the finished canvas failed.
    Encode(image::ImageError),
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(source) => write!(f, "failed to encode card as PNG: {}", source),
        }
    }
}

impl std::error::Error for CardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(source) => Some(source),
        }
    }
}

/// Composes couple cards. The title font is resolved once at startup.
pub struct CardComposer {
    font: FontArc,
}

impl CardComposer {
    pub fn new(font_path: Option<&Path>) -> Self {
        Self { font: load_font(font_path) }
    }

    /// Compose the card for the two participants.
    ///
    /// Inputs may have any dimensions of at least 1x1; both are resized to
    /// 300x300 working copies and pasted alpha-aware, so transparent avatar
    /// pixels keep the background tone.
    pub fn compose(
        &self,
        name_a: &str,
        image_a: &RgbaImage,
        name_b: &str,
        image_b: &RgbaImage,
        preferred: bool,
    ) -> Result<CoupleCard, CardError> {
        let background = if preferred { PREFERRED_BG } else { RANDOM_BG };
        let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, background);

        let left = imageops::resize(image_a, AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);
        let right = imageops::resize(image_b, AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);
        imageops::overlay(&mut canvas, &left, LEFT_ANCHOR.0, LEFT_ANCHOR.1);
        imageops::overlay(&mut canvas, &right, RIGHT_ANCHOR.0, RIGHT_ANCHOR.1);

        let title = if preferred { "Couple of the Day ❤️" } else { "Random Couple 💙" };
        let scale = PxScale::from(TITLE_SIZE);
        let (title_width, _) = text_size(scale, &self.font, title);
        let x = ((CANVAS_WIDTH as i32 - title_width as i32) / 2).max(0);
        draw_text_mut(&mut canvas, TITLE_COLOR, x, 10, scale, &self.font, title);

        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(CardError::Encode)?;

        let heart = if preferred { "❤️" } else { "💙" };
        let caption = format!("💖 {name_a} + {name_b} = {heart}");

        Ok(CoupleCard { png, caption })
    }
}

/// Avatar used when a profile photo cannot be fetched: a grey disc.
pub fn fallback_avatar() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(AVATAR_SIZE, AVATAR_SIZE, Rgba([200, 200, 200, 255]));
    let radius = (AVATAR_SIZE / 2) as i32;
    draw_filled_ellipse_mut(&mut img, (radius, radius), radius, radius, Rgba([150, 150, 150, 255]));
    img
}

/// Avatar for placeholder partners: solid grey, nobody to fetch a photo for.
pub fn placeholder_avatar() -> RgbaImage {
    RgbaImage::from_pixel(AVATAR_SIZE, AVATAR_SIZE, Rgba([150, 150, 150, 255]))
}

/// Resolve the title font: configured path first, then well-known system
/// locations, then the embedded fallback. Never fails.
fn load_font(configured: Option<&Path>) -> FontArc {
    if let Some(path) = configured {
        match read_font(path) {
            Some(font) => return font,
            None => warn!("Configured font {} not usable, falling back", path.display()),
        }
    }

    for path in SYSTEM_FONT_PATHS {
        if let Some(font) = read_font(Path::new(path)) {
            return font;
        }
    }

    info!("No system font found, using embedded fallback");
    let font = FontRef::try_from_slice(FALLBACK_FONT).expect("embedded font is valid");
    FontArc::from(font)
}

fn read_font(path: &Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            info!("Loaded title font from {}", path.display());
            Some(FontArc::from(font))
        }
        Err(e) => {
            warn!("Invalid font file {}: {e}", path.display());
            None
        }
    }
}
