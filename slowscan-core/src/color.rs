// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `color` module provides the BT.601 color-difference conversion and the mapping between
//! 8-bit component values and scan frequencies.

/// Black level of the standard deviation plan in Hz.
pub const LUMA_LOW_HZ: i32 = 1500;
/// White level of the standard deviation plan in Hz.
pub const LUMA_HIGH_HZ: i32 = 2300;

/// Sync tone of the narrow plan in Hz.
pub const NARROW_SYNC_HZ: i32 = 1900;
/// Black level of the narrow plan in Hz.
pub const NARROW_LOW_HZ: i32 = 2044;
/// White level of the narrow plan in Hz.
pub const NARROW_HIGH_HZ: i32 = 2300;

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Convert an RGB triple to BT.601 luminance and color-difference components, offset and
/// clamped to the 0-255 scan range.
pub fn rgb_to_ycc(rgb: (u8, u8, u8)) -> (u8, u8, u8) {
    let r = f64::from(rgb.0);
    let g = f64::from(rgb.1);
    let b = f64::from(rgb.2);

    let y = (16.0 + (0.256773 * r + 0.504097 * g + 0.097900 * b)) as i32;
    let ry = (128.0 + (0.439187 * r - 0.367766 * g - 0.071421 * b)) as i32;
    let by = (128.0 + (-0.148213 * r - 0.290974 * g + 0.439187 * b)) as i32;

    (clamp_u8(y), clamp_u8(ry), clamp_u8(by))
}

/// Map an 8-bit component value to its scan frequency on the standard 1500-2300 Hz plan.
pub fn component_to_freq(c: u8) -> f64 {
    f64::from(i32::from(c) * (LUMA_HIGH_HZ - LUMA_LOW_HZ) / 256 + LUMA_LOW_HZ)
}

/// Map an 8-bit component value to its scan frequency on the narrow 2044-2300 Hz plan.
pub fn component_to_freq_narrow(c: u8) -> f64 {
    f64::from(i32::from(c) * (NARROW_HIGH_HZ - NARROW_LOW_HZ) / 256 + NARROW_LOW_HZ)
}

/// Map a scan frequency back to an 8-bit component value on the standard plan. Frequencies
/// outside 1500-2300 Hz clamp to black and white respectively.
pub fn freq_to_component(freq_hz: f64) -> u8 {
    freq_to_component_on(freq_hz, f64::from(LUMA_LOW_HZ), f64::from(LUMA_HIGH_HZ))
}

/// Map a scan frequency back to an 8-bit component value on the narrow 2044-2300 Hz plan.
pub fn freq_to_component_narrow(freq_hz: f64) -> u8 {
    freq_to_component_on(freq_hz, f64::from(NARROW_LOW_HZ), f64::from(NARROW_HIGH_HZ))
}

fn freq_to_component_on(freq_hz: f64, lo: f64, hi: f64) -> u8 {
    if freq_hz <= lo {
        return 0;
    }
    if freq_hz >= hi {
        return 255;
    }

    clamp_u8(((freq_hz - lo) / (hi - lo) * 255.0 + 0.5) as i32)
}

/// Convert BT.601 luminance and color-difference components back to an RGB triple, clamped to
/// the 8-bit range.
pub fn ycc_to_rgb(y: u8, ry: u8, by: u8) -> (u8, u8, u8) {
    let y = 1.164 * (f64::from(y) - 16.0);
    let v = f64::from(ry) - 128.0;
    let u = f64::from(by) - 128.0;

    let r = (y + 1.596 * v) as i32;
    let g = (y - 0.813 * v - 0.391 * u) as i32;
    let b = (y + 2.018 * u) as i32;

    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_ycc_primaries() {
        // BT.601 studio-swing anchors; conversions truncate toward zero.
        assert_eq!(rgb_to_ycc((0, 0, 0)), (16, 128, 128));

        let (y, ry, by) = rgb_to_ycc((255, 255, 255));
        assert_eq!(y, 234);
        assert_eq!(ry, 128);
        assert_eq!(by, 128);

        // Pure red maxes R-Y; pure blue maxes B-Y.
        let (_, ry, _) = rgb_to_ycc((255, 0, 0));
        assert_eq!(ry, 239);
        let (_, _, by) = rgb_to_ycc((0, 0, 255));
        assert_eq!(by, 239);
    }

    #[test]
    fn verify_component_frequency_endpoints() {
        assert_eq!(component_to_freq(0), 1500.0);
        assert_eq!(component_to_freq(255), 2296.0);
        assert_eq!(component_to_freq_narrow(0), 2044.0);
        assert_eq!(component_to_freq_narrow(255), 2299.0);
    }

    #[test]
    fn verify_freq_to_component_inverse() {
        assert_eq!(freq_to_component(1500.0), 0);
        assert_eq!(freq_to_component(2300.0), 255);
        assert_eq!(freq_to_component(1000.0), 0);
        assert_eq!(freq_to_component(3000.0), 255);
        assert_eq!(freq_to_component_narrow(2044.0), 0);
        assert_eq!(freq_to_component_narrow(2300.0), 255);

        // Mid-scale round trip stays within the integer quantization error.
        for c in (0u8..=255).step_by(17) {
            let back = freq_to_component(component_to_freq(c));
            assert!((i32::from(back) - i32::from(c)).abs() <= 2, "{} -> {}", c, back);

            let back = freq_to_component_narrow(component_to_freq_narrow(c));
            assert!((i32::from(back) - i32::from(c)).abs() <= 2, "narrow {} -> {}", c, back);
        }
    }

    #[test]
    fn verify_ycc_round_trip() {
        // Forward then inverse conversion recovers the primaries within quantization error.
        for rgb in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (127, 127, 127), (40, 200, 90)] {
            let (y, ry, by) = rgb_to_ycc(rgb);
            let (r, g, b) = ycc_to_rgb(y, ry, by);
            assert!((i32::from(r) - i32::from(rgb.0)).abs() <= 4, "{:?} -> r {}", rgb, r);
            assert!((i32::from(g) - i32::from(rgb.1)).abs() <= 4, "{:?} -> g {}", rgb, g);
            assert!((i32::from(b) - i32::from(rgb.2)).abs() <= 4, "{:?} -> b {}", rgb, b);
        }
    }
}
