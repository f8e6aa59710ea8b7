use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Fixed plot colours
// ---------------------------------------------------------------------------

pub const CURVE_COLOR: Color32 = Color32::from_rgb(70, 150, 255);
pub const PROBE_COLOR: Color32 = Color32::from_rgb(120, 200, 120);
pub const KERNEL_COLOR: Color32 = Color32::from_rgb(230, 140, 60);
pub const DRAGGED_COLOR: Color32 = Color32::WHITE;

/// Hue of the training points; saturation follows the probe weight.
const POINT_HUE: f32 = 25.0;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

/// Colour of a training point with relative kernel weight `weight` in
/// `[0, 1]`: grey for no influence, saturated orange for full weight.
pub fn weight_color(weight: f64) -> Color32 {
    let w = weight.clamp(0.0, 1.0) as f32;
    hsl_to_color32(POINT_HUE, 0.05 + 0.85 * w, 0.7 - 0.15 * w)
}
