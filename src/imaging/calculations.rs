//! Pure calculation functions for preview dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Size of a proportional thumbnail `target_width` pixels wide.
///
/// Height is `round(target_width / width * height)`, never less than 1.
///
/// # Examples
/// ```
/// # use flyer_factory::imaging::preview_dimensions;
/// // Letter page at 100 DPI → 300px preview
/// assert_eq!(preview_dimensions((850, 1100), 300), (300, 388));
/// ```
pub fn preview_dimensions(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return (target_width, 1);
    }
    let h = (target_width as f64 / src_w as f64 * src_h as f64).round() as u32;
    (target_width, h.max(1))
}

/// Pixel size of a page of `width` x `height` points rendered at `dpi`.
pub fn raster_dimensions(width: f32, height: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f64 / 72.0;
    (
        (width as f64 * scale).round() as u32,
        (height as f64 * scale).round() as u32,
    )
}
