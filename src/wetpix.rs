// ============================================================================
// WET PIXEL FORMAT — 16-channel fixed-point watercolor pixel
// ============================================================================

use bytemuck::{Pod, Zeroable};

/// Fixed-point scale shared by every channel: `raw / 8192.0` is the
/// physical value.
pub const FIXED_SCALE: f64 = 8192.0;

/// Bytes per canvas pixel (two stacked 8-channel sub-records).
pub const PIXEL_SIZE: usize = 32;
/// Total channel count across both sub-records.
pub const CHANNELS: usize = 16;
/// Color channels (density + myth for r/g/b, in both sub-records).
pub const COLOR_CHANNELS: usize = 12;
/// Substance channels (water + height, in both sub-records).
pub const SUBSTANCE_CHANNELS: usize = 4;

/// Stable colorspace identifier. Collaborators must check this tag before
/// handing a raw pixel buffer to the simulation; buffers carrying any other
/// tag are silently refused (see `WetCanvas::from_bytes`).
pub const COLORSPACE_ID: &str = "WET";

/// Upper clamp for the water and height channels when converting from
/// floating point. Color channels use the full u16 range.
const SUBSTANCE_MAX: f64 = 511.0;

// ============================================================================
// Fixed-point pixel
// ============================================================================

/// One channel group: pigment concentration (`*d`), dichroic "myth"
/// concentration (`*w`) for red/green/blue, plus water volume `w` and paper
/// surface height `h`. All unsigned 16-bit fixed point, scale 1/8192.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WetPixel {
    pub rd: u16,
    pub rw: u16,
    pub gd: u16,
    pub gw: u16,
    pub bd: u16,
    pub bw: u16,
    pub w: u16,
    pub h: u16,
}

impl WetPixel {
    /// Expand to the floating-point representation used by all mixing and
    /// diffusion arithmetic.
    pub fn to_double(&self) -> WetPixelDouble {
        let s = 1.0 / FIXED_SCALE;
        WetPixelDouble {
            rd: self.rd as f64 * s,
            rw: self.rw as f64 * s,
            gd: self.gd as f64 * s,
            gw: self.gw as f64 * s,
            bd: self.bd as f64 * s,
            bw: self.bw as f64 * s,
            w: self.w as f64 * s,
            h: self.h as f64 * s,
        }
    }

    /// Quantize back to fixed point. Color fields clamp to the full u16
    /// range; water and height clamp to [0, 511]. Rounding is half-away
    /// (`floor(x + 0.5)` for the non-negative domain).
    pub fn from_double(src: &WetPixelDouble) -> WetPixel {
        WetPixel {
            rd: quant_color(src.rd),
            rw: quant_color(src.rw),
            gd: quant_color(src.gd),
            gw: quant_color(src.gw),
            bd: quant_color(src.bd),
            bw: quant_color(src.bw),
            w: quant_substance(src.w),
            h: quant_substance(src.h),
        }
    }

    /// Quantize only the six color fields from `src`, leaving `w` and `h`
    /// untouched. Used by the physics passes, which adjust color
    /// concentrations without re-quantizing (and possibly re-clamping) the
    /// substance channels.
    pub fn set_colors_from(&mut self, src: &WetPixelDouble) {
        self.rd = quant_color(src.rd);
        self.rw = quant_color(src.rw);
        self.gd = quant_color(src.gd);
        self.gw = quant_color(src.gw);
        self.bd = quant_color(src.bd);
        self.bw = quant_color(src.bw);
    }
}

fn quant_color(v: f64) -> u16 {
    (v * FIXED_SCALE + 0.5).floor().clamp(0.0, 65535.0) as u16
}

fn quant_substance(v: f64) -> u16 {
    (v * FIXED_SCALE + 0.5).floor().clamp(0.0, SUBSTANCE_MAX) as u16
}

// ============================================================================
// Floating-point pixel
// ============================================================================

/// Floating-point counterpart of `WetPixel`. All mixing, dilution and
/// diffusion math runs here; fixed point would overflow or lose precision.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WetPixelDouble {
    pub rd: f64,
    pub rw: f64,
    pub gd: f64,
    pub gw: f64,
    pub bd: f64,
    pub bw: f64,
    pub w: f64,
    pub h: f64,
}

impl WetPixelDouble {
    /// Scale the six color fields by `dilution`. Water and height carry
    /// over unchanged.
    pub fn dilute(&self, dilution: f64) -> WetPixelDouble {
        WetPixelDouble {
            rd: self.rd * dilution,
            rw: self.rw * dilution,
            gd: self.gd * dilution,
            gw: self.gw * dilution,
            bd: self.bd * dilution,
            bw: self.bw * dilution,
            w: self.w,
            h: self.h,
        }
    }

    /// Scale the six color fields *and* the water volume by `dilution`.
    /// This is the weighting used when combining flow contributions: a
    /// pixel donating a fraction of itself donates that fraction of its
    /// water too.
    pub fn reduce(&self, dilution: f64) -> WetPixelDouble {
        let mut out = self.dilute(dilution);
        out.w = self.w * dilution;
        out
    }

    /// Field-wise accumulate of the six color fields and water volume.
    /// Height is left alone: paper topography is a property of the pixel,
    /// not something that flows.
    pub fn accumulate(&mut self, other: &WetPixelDouble) {
        self.rd += other.rd;
        self.rw += other.rw;
        self.gd += other.gd;
        self.gw += other.gw;
        self.bd += other.bd;
        self.bw += other.bw;
        self.w += other.w;
    }
}

// ============================================================================
// Canvas pixel — paint layer over adsorbed layer
// ============================================================================

/// The full per-canvas-pixel storage unit: the mobile `paint` layer on top
/// of the `adsorb` layer (pigment bound into the paper fibers). Pigment
/// migrates paint → adsorb during the adsorption pass, never back.
///
/// Layout is `#[repr(C)]`, 16 × u16 host-endian, `paint` first — raw byte
/// buffers from collaborators are reinterpreted through bytemuck.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WetPack {
    pub paint: WetPixel,
    pub adsorb: WetPixel,
}

impl WetPack {
    /// View a pack as its raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Read a pack out of a 32-byte slice (alignment-free). Returns `None`
    /// when the length is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Option<WetPack> {
        if bytes.len() != PIXEL_SIZE {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dbl(v: f64) -> WetPixelDouble {
        WetPixelDouble { rd: v, rw: v, gd: v, gw: v, bd: v, bw: v, w: v, h: v }
    }

    #[test]
    fn pack_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<WetPack>(), PIXEL_SIZE);
        assert_eq!(std::mem::size_of::<WetPixel>(), PIXEL_SIZE / 2);
        assert_eq!(CHANNELS, COLOR_CHANNELS + SUBSTANCE_CHANNELS);
    }

    #[test]
    fn from_double_rounds_half_away() {
        // 0.5 raw units above an integer must round up.
        let v = 100.5 / FIXED_SCALE;
        let pix = WetPixel::from_double(&dbl(v));
        assert_eq!(pix.rd, 101);
        let v = 100.4 / FIXED_SCALE;
        let pix = WetPixel::from_double(&dbl(v));
        assert_eq!(pix.rd, 100);
    }

    #[test]
    fn from_double_clamps_fields() {
        // 8.0 * 8192 = 65536: one past the color ceiling.
        let pix = WetPixel::from_double(&dbl(8.0));
        assert_eq!(pix.rd, 65535);
        assert_eq!(pix.bw, 65535);
        // Water and height saturate much earlier.
        assert_eq!(pix.w, 511);
        assert_eq!(pix.h, 511);
        // Negative input clamps to zero.
        let pix = WetPixel::from_double(&dbl(-1.0));
        assert_eq!(pix.rd, 0);
        assert_eq!(pix.w, 0);
    }

    #[test]
    fn round_trip_is_idempotent_after_first_clamp() {
        // Over-range inputs in [0, 8): one conversion clamps, after which
        // to_double/from_double must be the identity.
        for &v in &[0.0, 0.03125, 0.9999, 1.0, 3.5, 7.875, 7.9999] {
            let first = WetPixel::from_double(&dbl(v));
            let again = WetPixel::from_double(&first.to_double());
            assert_eq!(first, again, "round trip diverged for {}", v);
        }
    }

    #[test]
    fn reduce_scales_water_but_dilute_does_not() {
        let p = WetPixelDouble { rd: 1.0, rw: 0.5, gd: 0.0, gw: 0.0, bd: 2.0, bw: 1.0, w: 0.25, h: 0.125 };
        let d = p.dilute(0.5);
        assert_eq!(d.rd, 0.5);
        assert_eq!(d.w, 0.25);
        assert_eq!(d.h, 0.125);
        let r = p.reduce(0.5);
        assert_eq!(r.rd, 0.5);
        assert_eq!(r.w, 0.125);
        assert_eq!(r.h, 0.125);
    }

    #[test]
    fn accumulate_leaves_height_alone() {
        let mut a = dbl(1.0);
        a.accumulate(&dbl(0.5));
        assert_eq!(a.rd, 1.5);
        assert_eq!(a.w, 1.5);
        assert_eq!(a.h, 1.0);
    }

    #[test]
    fn pack_byte_views_round_trip() {
        let mut pack = WetPack::default();
        pack.paint.rd = 0x1234;
        pack.adsorb.h = 192;
        let bytes = pack.as_bytes().to_vec();
        let back = WetPack::from_bytes(&bytes).unwrap();
        assert_eq!(back, pack);
        assert!(WetPack::from_bytes(&bytes[1..]).is_none());
    }
}
