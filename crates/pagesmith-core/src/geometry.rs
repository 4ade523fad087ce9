//! Shared geometry helpers for rotation and range checks.
//!
//! Angles are in degrees throughout. A positive angle is a counter-clockwise
//! rotation as seen on screen (y axis pointing down).

/// Sine and cosine of an angle given in degrees.
pub fn sin_cos_deg(angle: f32) -> (f32, f32) {
    let (sin, cos) = (f64::from(angle)).to_radians().sin_cos();
    (sin as f32, cos as f32)
}

/// Rotate a point around the origin using precomputed sine and cosine.
pub fn rotate_point(x: f32, y: f32, sin: f32, cos: f32) -> (f32, f32) {
    (x * cos - y * sin, x * sin + y * cos)
}

/// Size of the canvas needed to hold a `width` x `height` image rotated by
/// `angle` degrees.
///
/// The four corner pixel centers are rotated about the image center and the
/// bounding box is measured. A fractional extent grows the canvas by two
/// pixels so interpolated edge pixels are never clipped.
pub fn rotated_size(width: u32, height: u32, angle: f32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let x_off = width as f32 / 2.0 - 0.5;
    let y_off = height as f32 / 2.0 - 0.5;
    let (sin, cos) = sin_cos_deg(angle);

    let right = (width - 1) as f32 - x_off;
    let bottom = (height - 1) as f32 - y_off;
    let corners = [
        rotate_point(-x_off, -y_off, sin, cos),
        rotate_point(right, -y_off, sin, cos),
        rotate_point(right, bottom, sin, cos),
        rotate_point(-x_off, bottom, sin, cos),
    ];

    let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
    let (mut min_y, mut max_y) = (f32::MAX, f32::MIN);
    for (x, y) in corners {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    (padded_extent(max_x - min_x + 1.0), padded_extent(max_y - min_y + 1.0))
}

fn padded_extent(extent: f32) -> u32 {
    if extent - extent.floor() > 0.01 {
        (extent + 2.0) as u32
    } else {
        extent as u32
    }
}

/// Inclusive range check.
pub fn in_range(value: i64, from: i64, to: i64) -> bool {
    from <= value && value <= to
}

/// Inclusive range check with a small tolerance for float noise.
pub fn in_range_f32(value: f32, from: f32, to: f32) -> bool {
    const EPSILON: f32 = 0.000_01;
    from <= value + EPSILON && value - EPSILON <= to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_size_zero_angle_keeps_size() {
        assert_eq!(rotated_size(400, 700, 0.0), (400, 700));
    }

    #[test]
    fn test_rotated_size_right_angle_swaps_axes() {
        let (w, h) = rotated_size(400, 700, 90.0);
        // sin/cos noise may add the two-pixel pad
        assert!(w == 700 || w == 702, "width was {w}");
        assert!(h == 400 || h == 402, "height was {h}");
    }

    #[test]
    fn test_rotated_size_grows_for_small_angle() {
        let (w, h) = rotated_size(400, 700, 1.4);
        assert!(w > 400 && h > 700);
        // 400*cos + 700*sin ~= 417
        assert!(w < 425, "width was {w}");
    }

    #[test]
    fn test_rotated_size_empty_image() {
        assert_eq!(rotated_size(0, 10, 3.0), (0, 0));
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let (sin, cos) = sin_cos_deg(90.0);
        let (x, y) = rotate_point(1.0, 0.0, sin, cos);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_in_range() {
        assert!(in_range(5, 1, 5));
        assert!(!in_range(6, 1, 5));
        assert!(in_range_f32(1.2, 1.2, 1.6));
        assert!(in_range_f32(1.4000001, 1.2, 1.6));
        assert!(!in_range_f32(1.7, 1.2, 1.6));
    }
}
