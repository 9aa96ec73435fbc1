// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint styles and the packed fill descriptor.
//!
//! A draw call encodes its complete paint state into one 19-word descriptor
//! in the frame's data buffer; every tile the draw emits points back at it.
//! Word layout: packed `mode|kind|spaa|reserved` bytes, two RGBA8 colors,
//! the clip matrix, the inverted paint matrix, then extent and radius pairs
//! (f32 bit patterns, row order `xx xy xt yx yy yt`).

use peniko::color::{AlphaColor, Srgb};
use peniko::kurbo::Affine;

use crate::geom::{encode_affine, AffineExt};
use crate::FillRule;

pub type Color = AlphaColor<Srgb>;

/// Descriptor size in u32 words.
pub const FILL_WORDS: usize = 19;

/// Clip matrix mapping any screen point to (0.5, 0.5), inside the unit box.
pub(crate) const NO_CLIP: [f32; 6] = [0.0, 0.0, 0.5, 0.0, 0.0, 0.5];

const KIND_FLAT: u8 = 0;
const KIND_LINEAR: u8 = 1;
const KIND_RADIAL: u8 = 2;
const KIND_RADIAL_HUE: u8 = 3;
const KIND_RADIAL_SAT: u8 = 4;
const KIND_BOX: u8 = 5;
const KIND_BOX_HUE: u8 = 6;
const KIND_BOX_SAT: u8 = 7;
const KIND_GRID: u8 = 8;

/// What to paint inside the covered area of a fill.
///
/// Positions and sizes are in the current transform's object space. The
/// hue/saturation variants evaluate an HSV ramp in the shader and take no
/// colors; their white base can still be tinted by the global alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillStyle {
    Flat {
        color: Color,
    },
    /// Linear gradient from `(x0, y0)` to `(x1, y1)`.
    Linear {
        color0: Color,
        color1: Color,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
    },
    /// Radial gradient between radii `r0` and `r1` around `(x, y)`.
    Radial {
        color0: Color,
        color1: Color,
        x: f32,
        y: f32,
        r0: f32,
        r1: f32,
    },
    /// Radial hue wheel (angle selects hue).
    RadialHue {
        x: f32,
        y: f32,
        r0: f32,
        r1: f32,
        saturation: f32,
        value: f32,
    },
    /// Radial saturation/value disc at a fixed hue.
    RadialSaturation {
        x: f32,
        y: f32,
        r0: f32,
        r1: f32,
        hue: f32,
    },
    /// Rounded-box distance gradient over the rect at `(x, y)`.
    Box {
        color0: Color,
        color1: Color,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        r0: f32,
        r1: f32,
    },
    /// Hue along x, fixed saturation and value, over the rect.
    BoxHue {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        saturation: f32,
        value: f32,
    },
    /// Saturation along x, value along y, fixed hue, over the rect.
    BoxSaturation {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        hue: f32,
    },
    /// Anti-aliased grid lines of the given thickness on cell size `(w, h)`.
    Grid {
        color0: Color,
        color1: Color,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        thickness: f32,
    },
}

/// The packed 19-word record written at each draw's data-buffer base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillDescriptor(pub [u32; FILL_WORDS]);

impl FillDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn encode(
        rule: FillRule,
        kind: u8,
        color0: Color,
        color1: Color,
        extent: [f32; 2],
        radius: [f32; 2],
        matrix: Affine,
        clip: [f32; 6],
        spaa: f32,
        alpha: f32,
    ) -> FillDescriptor {
        let spaa8 = (spaa * 255.0) as i32;
        let spaa8 = spaa8.clamp(0, 255) as u32;
        let alpha8 = (alpha * 255.0) as i32;
        let alpha8 = alpha8.clamp(0, 255) as u32;
        let inv = encode_affine(matrix.safe_inverse());

        let mut w = [0u32; FILL_WORDS];
        w[0] = (rule.mode() as u8 as u32) | ((kind as u32) << 8) | (spaa8 << 16);
        w[1] = pack_color(color0, alpha8);
        w[2] = pack_color(color1, alpha8);
        for i in 0..6 {
            w[3 + i] = clip[i].to_bits();
            w[9 + i] = inv[i].to_bits();
        }
        w[15] = extent[0].to_bits();
        w[16] = extent[1].to_bits();
        w[17] = radius[0].to_bits();
        w[18] = radius[1].to_bits();
        FillDescriptor(w)
    }

    pub fn words(&self) -> &[u32; FILL_WORDS] {
        &self.0
    }

    pub fn rule_mode(&self) -> i8 {
        (self.0[0] & 0xFF) as u8 as i8
    }

    pub fn kind(&self) -> u8 {
        ((self.0[0] >> 8) & 0xFF) as u8
    }

    pub fn spaa(&self) -> f32 {
        ((self.0[0] >> 16) & 0xFF) as f32 / 255.0
    }
}

/// RGBA8 packing with the global alpha folded into the alpha byte.
fn pack_color(c: Color, alpha8: u32) -> u32 {
    let rgba = c.to_rgba8();
    let a = u32::from(rgba.a) * alpha8 / 255;
    u32::from(rgba.r) | (u32::from(rgba.g) << 8) | (u32::from(rgba.b) << 16) | (a << 24)
}

impl FillStyle {
    /// Encode this style under the given draw state.
    ///
    /// The paint matrix is built by post-concatenating the style's placement
    /// onto the current transform, then inverted so the evaluator can map
    /// screen points into paint space.
    pub(crate) fn descriptor(
        &self,
        rule: FillRule,
        transform: Affine,
        clip: [f32; 6],
        spaa: f32,
        alpha: f32,
    ) -> FillDescriptor {
        let white = AlphaColor::new([1.0, 1.0, 1.0, 1.0]);
        let (kind, c0, c1, extent, radius, matrix) = match *self {
            FillStyle::Flat { color } => (KIND_FLAT, color, color, [0.0; 2], [0.0; 2], transform),
            FillStyle::Linear {
                color0,
                color1,
                x0,
                y0,
                x1,
                y1,
            } => (
                KIND_LINEAR,
                color0,
                color1,
                [x1 - x0, y1 - y0],
                [0.0; 2],
                transform * Affine::translate((x0 as f64, y0 as f64)),
            ),
            FillStyle::Radial {
                color0,
                color1,
                x,
                y,
                r0,
                r1,
            } => (
                KIND_RADIAL,
                color0,
                color1,
                [0.0; 2],
                [r0, r1],
                transform * Affine::translate((x as f64, y as f64)),
            ),
            FillStyle::RadialHue {
                x,
                y,
                r0,
                r1,
                saturation,
                value,
            } => (
                KIND_RADIAL_HUE,
                white,
                white,
                [saturation, value],
                [r0, r1],
                transform * Affine::translate((x as f64, y as f64)),
            ),
            FillStyle::RadialSaturation { x, y, r0, r1, hue } => (
                KIND_RADIAL_SAT,
                white,
                white,
                [hue, 0.0],
                [r0, r1],
                transform * Affine::translate((x as f64, y as f64)),
            ),
            FillStyle::Box {
                color0,
                color1,
                x,
                y,
                w,
                h,
                r0,
                r1,
            } => (
                KIND_BOX,
                color0,
                color1,
                [w / 2.0, h / 2.0],
                [r0, r1],
                transform * Affine::translate(((x + w / 2.0) as f64, (y + h / 2.0) as f64)),
            ),
            FillStyle::BoxHue {
                x,
                y,
                w,
                h,
                saturation,
                value,
            } => (
                KIND_BOX_HUE,
                white,
                white,
                [saturation, value],
                [0.0; 2],
                transform
                    * Affine::translate((x as f64, y as f64))
                    * Affine::scale_non_uniform(w as f64, h as f64),
            ),
            FillStyle::BoxSaturation { x, y, w, h, hue } => (
                KIND_BOX_SAT,
                white,
                white,
                [hue, 0.0],
                [0.0; 2],
                transform
                    * Affine::translate((x as f64, y as f64))
                    * Affine::scale_non_uniform(w as f64, h as f64),
            ),
            FillStyle::Grid {
                color0,
                color1,
                x,
                y,
                w,
                h,
                thickness,
            } => (
                KIND_GRID,
                color0,
                color1,
                [w, h],
                [thickness, 0.0],
                transform * Affine::translate((x as f64, y as f64)),
            ),
        };
        FillDescriptor::encode(rule, kind, c0, c1, extent, radius, matrix, clip, spaa, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, FillDescriptor, FillStyle, FILL_WORDS, NO_CLIP};
    use crate::FillRule;
    use peniko::kurbo::Affine;

    fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color::from_rgba8(r, g, b, a)
    }

    #[test]
    fn flat_descriptor_golden_words() {
        let style = FillStyle::Flat {
            color: rgba(0x10, 0x20, 0x30, 0xFF),
        };
        let d = style.descriptor(FillRule::NonZero, Affine::IDENTITY, NO_CLIP, 0.0, 1.0);
        let w = d.words();
        assert_eq!(w.len(), FILL_WORDS);
        // mode 2, kind 0, spaa 0.
        assert_eq!(w[0], 0x0000_0002);
        assert_eq!(w[1], 0xFF30_2010);
        assert_eq!(w[2], 0xFF30_2010);
        // No-clip matrix.
        assert_eq!(f32::from_bits(w[3]), 0.0);
        assert_eq!(f32::from_bits(w[5]), 0.5);
        assert_eq!(f32::from_bits(w[8]), 0.5);
        // Identity inverse paint matrix.
        assert_eq!(f32::from_bits(w[9]), 1.0);
        assert_eq!(f32::from_bits(w[10]), 0.0);
        assert_eq!(f32::from_bits(w[13]), 1.0);
    }

    #[test]
    fn mode_byte_encodes_negative_rule() {
        let style = FillStyle::Flat {
            color: rgba(0, 0, 0, 255),
        };
        let d = style.descriptor(FillRule::Negative, Affine::IDENTITY, NO_CLIP, 0.0, 1.0);
        assert_eq!(d.words()[0] & 0xFF, 0xFF);
        assert_eq!(d.rule_mode(), -1);
    }

    #[test]
    fn global_alpha_scales_alpha_byte_only() {
        let style = FillStyle::Flat {
            color: rgba(0x40, 0x50, 0x60, 0x80),
        };
        let d = style.descriptor(FillRule::NonZero, Affine::IDENTITY, NO_CLIP, 0.0, 0.5);
        // 0x80 * 127 / 255 = 63.
        assert_eq!(d.words()[1], 0x3F60_5040);
    }

    #[test]
    fn linear_matrix_translates_to_origin() {
        let style = FillStyle::Linear {
            color0: rgba(255, 0, 0, 255),
            color1: rgba(0, 0, 255, 255),
            x0: 10.0,
            y0: 20.0,
            x1: 110.0,
            y1: 20.0,
        };
        let d = style.descriptor(FillRule::NonZero, Affine::IDENTITY, NO_CLIP, 0.0, 1.0);
        let w = d.words();
        assert_eq!(d.kind(), 1);
        // Extent is the gradient delta.
        assert_eq!(f32::from_bits(w[15]), 100.0);
        assert_eq!(f32::from_bits(w[16]), 0.0);
        // Inverse of translate(10, 20): xt = -10, yt = -20.
        assert_eq!(f32::from_bits(w[11]), -10.0);
        assert_eq!(f32::from_bits(w[14]), -20.0);
    }

    #[test]
    fn spaa_byte_round_trip() {
        let style = FillStyle::Flat {
            color: rgba(0, 0, 0, 255),
        };
        let d = style.descriptor(FillRule::NonZero, Affine::IDENTITY, NO_CLIP, 0.75, 1.0);
        assert!((d.spaa() - 0.75).abs() < 1.0 / 255.0);
    }

    #[test]
    fn singular_paint_matrix_falls_back_to_identity() {
        let style = FillStyle::Radial {
            color0: rgba(255, 255, 255, 255),
            color1: rgba(0, 0, 0, 255),
            x: 0.0,
            y: 0.0,
            r0: 0.0,
            r1: 10.0,
        };
        let d = style.descriptor(FillRule::NonZero, Affine::scale(0.0), NO_CLIP, 0.0, 1.0);
        let w = d.words();
        assert_eq!(f32::from_bits(w[9]), 1.0);
        assert_eq!(f32::from_bits(w[13]), 1.0);
    }

    #[test]
    fn descriptor_round_trips_as_words() {
        let style = FillStyle::Grid {
            color0: rgba(1, 2, 3, 4),
            color1: rgba(5, 6, 7, 8),
            x: 0.0,
            y: 0.0,
            w: 32.0,
            h: 32.0,
            thickness: 1.0,
        };
        let d = style.descriptor(FillRule::EvenOdd, Affine::IDENTITY, NO_CLIP, 0.0, 1.0);
        assert_eq!(FillDescriptor(*d.words()), d);
        assert_eq!(d.kind(), 8);
        assert_eq!(d.rule_mode(), 3);
    }
}
