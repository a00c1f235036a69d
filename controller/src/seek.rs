use common::SeekBarRegion;

/// Map a pointer's horizontal coordinate within the progress-bar region to
/// a seek fraction in `[0, 1]`.
///
/// Pointers left of the region clamp to 0, right of it to 1. A degenerate
/// region (non-positive width) maps everything to 0.
pub fn pointer_fraction(region: SeekBarRegion, pointer_x: f32) -> f64 {
    if region.width <= 0.0 {
        return 0.0;
    }
    (f64::from(pointer_x - region.left) / f64::from(region.width)).clamp(0.0, 1.0)
}
