use image::{GrayImage, Luma};

pub const MASK_EXCLUDED: u8 = 255;
pub const MASK_AVAILABLE: u8 = 0;

/// Square mask whose inscribed disk is open to text. Pixels strictly farther
/// than `size / 2` from the centre are excluded.
pub fn circular_mask(size: u32) -> GrayImage {
    let center = i64::from(size / 2);
    let radius_sq = center * center;
    GrayImage::from_fn(size, size, |x, y| {
        let dx = i64::from(x) - center;
        let dy = i64::from(y) - center;
        if dx * dx + dy * dy > radius_sq {
            Luma([MASK_EXCLUDED])
        } else {
            Luma([MASK_AVAILABLE])
        }
    })
}

pub fn is_excluded(mask: &GrayImage, x: u32, y: u32) -> bool {
    mask.get_pixel(x, y).0[0] != MASK_AVAILABLE
}
