// ============================================================================
// COMPOSITOR — absorption/transmission LUT + wet pixel → RGB
// ============================================================================
//
// Converts wet pixel pairs into displayable RGB using a precomputed table
// that packs a transmission numerator and an exponential decay term into
// one u32 per optical density step. The adsorbed layer is composited
// first, the paint layer after it — paint sits visually on top of pigment
// already bound into the paper, and that ordering is load-bearing.
//
// All phase state for the wetness shimmer lives in WetRenderer; there are
// no globals and no singletons here.

use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::WetCanvas;
use crate::wetpix::{WetPack, WetPixel};

/// Entries in the density → (transmission, decay) table.
const RENDER_TABLE_SIZE: usize = 4096;

// ============================================================================
// Lookup table
// ============================================================================

/// Precomputed absorption table: entry `i` covers optical density
/// `i / 512`, packing `round(0xff00 / i)` in the high 16 bits (zero at
/// `i = 0`) and `round(0x8000·e^(−i/512))` in the low 16. Built once,
/// never mutated.
pub struct RenderTable {
    entries: Vec<u32>,
}

impl RenderTable {
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(RENDER_TABLE_SIZE);
        for i in 0..RENDER_TABLE_SIZE {
            let d = i as f64 / 512.0;
            let transmission: u32 = if i == 0 {
                0
            } else {
                (0xff00 as f64 / i as f64 + 0.5).floor() as u32
            };
            let decay = (0x8000 as f64 * (-d).exp() + 0.5).floor() as u32;
            entries.push((transmission << 16) | decay);
        }
        Self { entries }
    }

    /// Split entry for a raw (pre-shifted) density index. The index is
    /// clamped to the table, never rejected.
    #[inline]
    fn lookup(&self, d: usize) -> (i32, i32) {
        let entry = self.entries[d.min(RENDER_TABLE_SIZE - 1)];
        ((entry >> 16) as i32, (entry & 0xffff) as i32)
    }
}

impl Default for RenderTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Overlay the periodic wetness shimmer on wet areas.
    pub show_wetness: bool,
}

/// Owns the lookup table and the shimmer phase counters. The inner `phase`
/// advances once per overlay invocation (mod 3); `phase_big` advances once
/// per external timer tick (mod 4) and resets `phase` when it wraps.
pub struct WetRenderer {
    table: RenderTable,
    phase: u32,
    phase_big: u32,
    pub options: RenderOptions,
}

impl WetRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { table: RenderTable::new(), phase: 0, phase_big: 0, options }
    }

    /// Composite one sub-pixel onto `rgb` in place. Per channel: the myth
    /// concentration scaled by the table's transmission term gives the
    /// blended value, then the background shows through by the exponential
    /// decay of the density. Output saturates to [0, 255].
    pub fn composite_pixel(&self, rgb: &mut [u8; 3], pix: &WetPixel) {
        let channels = [(pix.rw, pix.rd), (pix.gw, pix.gd), (pix.bw, pix.bd)];
        for (c, &(myth, dens)) in channels.iter().enumerate() {
            let w = (myth >> 4) as i32;
            let d = (dens >> 4) as usize;
            let (transmission, decay) = self.table.lookup(d);
            // Myth in excess of the density would overflow the decay
            // product below; saturate to the channel range first.
            let blended = ((w * transmission + 0x80) >> 8).min(255);
            let out = blended + (((rgb[c] as i32 - blended) * decay + 0x4000) >> 15);
            rgb[c] = out.clamp(0, 255) as u8;
        }
    }

    /// Composite a full pack: adsorbed layer first, paint on top.
    pub fn composite_pack(&self, rgb: &mut [u8; 3], pack: &WetPack) {
        self.composite_pixel(rgb, &pack.adsorb);
        self.composite_pixel(rgb, &pack.paint);
    }

    /// Darken wet areas on a shimmer cycle: one invocation in three
    /// applies the highlight, driven by the per-invocation phase counter.
    /// Call order therefore matters — full-canvas renders walk pixels in
    /// scan order so the shimmer forms a stable dither pattern that
    /// `tick_phase` shifts over time.
    pub fn wetness_overlay(&mut self, rgb: &mut [u8; 3], pack: &WetPack) {
        let shimmer = self.phase == 0;
        self.phase = (self.phase + 1) % 3;
        let highlight = 255 - (pack.paint.w >> 1) as i32;
        if shimmer && highlight < 255 {
            for c in rgb.iter_mut() {
                let dark = 255 - (((255 - *c as i32) * highlight) >> 8);
                *c = dark.clamp(0, 255) as u8;
            }
        }
    }

    /// External timer entry point: advance the outer phase (mod 4) and
    /// restart the inner shimmer cycle when it wraps.
    pub fn tick_phase(&mut self) {
        self.phase_big = (self.phase_big + 1) & 3;
        if self.phase_big == 0 {
            self.phase = 0;
        }
    }

    /// Render the whole canvas onto a white background. Rows composite in
    /// parallel unless the wetness overlay is on — the overlay's phase
    /// counter is advanced per pixel, so that path must stay sequential.
    pub fn render(&mut self, canvas: &WetCanvas) -> RgbaImage {
        let (w, h) = (canvas.width(), canvas.height());
        let mut out = RgbaImage::new(w, h);
        if w == 0 || h == 0 {
            return out;
        }
        let stride = w as usize * 4;

        if self.options.show_wetness {
            for y in 0..h {
                for (x, pack) in canvas.row(y, 0, w).iter().enumerate() {
                    let mut rgb = [255u8; 3];
                    self.composite_pack(&mut rgb, pack);
                    self.wetness_overlay(&mut rgb, pack);
                    out.put_pixel(x as u32, y, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
                }
            }
        } else {
            let renderer = &*self;
            out.as_mut()
                .par_chunks_mut(stride)
                .enumerate()
                .for_each(|(y, row_out)| {
                    let row = canvas.row(y as u32, 0, w);
                    for (x, pack) in row.iter().enumerate() {
                        let mut rgb = [255u8; 3];
                        renderer.composite_pack(&mut rgb, pack);
                        let off = x * 4;
                        row_out[off] = rgb[0];
                        row_out[off + 1] = rgb[1];
                        row_out[off + 2] = rgb[2];
                        row_out[off + 3] = 255;
                    }
                });
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wetpix::WetPixelDouble;

    #[test]
    fn render_table_endpoints() {
        let table = RenderTable::new();
        // i = 0: no transmission numerator, full decay term.
        assert_eq!(table.lookup(0), (0, 0x8000));
        // i = 1: 0xff00 / 1 with e^(−1/512) decay.
        let (t, k) = table.lookup(1);
        assert_eq!(t, 0xff00);
        assert_eq!(k, (0x8000 as f64 * (-1.0 / 512.0_f64).exp() + 0.5).floor() as i32);
        // Out-of-range indices clamp to the last entry.
        assert_eq!(table.lookup(4095), table.lookup(100_000));
    }

    #[test]
    fn zero_pigment_leaves_white_untouched() {
        let renderer = WetRenderer::new(RenderOptions::default());
        let mut rgb = [255u8; 3];
        let pack = WetPack::default();
        renderer.composite_pack(&mut rgb, &pack);
        assert_eq!(rgb, [255, 255, 255]);
    }

    #[test]
    fn dense_pigment_darkens_background() {
        let renderer = WetRenderer::new(RenderOptions::default());
        // Strong absorber in every channel, no myth reflectance.
        let pix = WetPixel::from_double(&WetPixelDouble {
            rd: 4.0, rw: 0.0, gd: 4.0, gw: 0.0, bd: 4.0, bw: 0.0, w: 0.0, h: 0.0,
        });
        let mut rgb = [255u8; 3];
        renderer.composite_pixel(&mut rgb, &pix);
        // e^(-4) ≈ 0.018 → white decays to single digits.
        assert!(rgb[0] < 10, "expected near-black, got {}", rgb[0]);
        assert_eq!(rgb[0], rgb[1]);
        assert_eq!(rgb[1], rgb[2]);
    }

    #[test]
    fn adsorb_composites_under_paint() {
        let renderer = WetRenderer::new(RenderOptions::default());
        // Opaque-ish red paint over a dense green adsorbed layer: the
        // paint layer must win where it absorbs.
        let red = WetPixel::from_double(&WetPixelDouble {
            rd: 0.1, rw: 0.09, gd: 3.0, gw: 0.0, bd: 3.0, bw: 0.0, w: 0.0, h: 0.0,
        });
        let green = WetPixel::from_double(&WetPixelDouble {
            rd: 3.0, rw: 0.0, gd: 0.1, gw: 0.09, bd: 3.0, bw: 0.0, w: 0.0, h: 0.0,
        });
        let pack = WetPack { paint: red, adsorb: green };
        let mut rgb = [255u8; 3];
        renderer.composite_pack(&mut rgb, &pack);
        assert!(rgb[0] > rgb[1], "paint layer should dominate: {:?}", rgb);
    }

    #[test]
    fn shimmer_fires_every_third_invocation() {
        let mut renderer = WetRenderer::new(RenderOptions { show_wetness: true });
        let mut wet = WetPack::default();
        wet.paint.w = 400; // highlight = 255 − 200 = 55, well below 255
        let mut fired = Vec::new();
        for _ in 0..6 {
            let mut rgb = [200u8; 3];
            renderer.wetness_overlay(&mut rgb, &wet);
            fired.push(rgb[0] != 200);
        }
        assert_eq!(fired, [true, false, false, true, false, false]);
    }

    #[test]
    fn dry_pixels_never_shimmer() {
        let mut renderer = WetRenderer::new(RenderOptions { show_wetness: true });
        let dry = WetPack::default(); // paint.w = 0 → highlight = 255
        for _ in 0..6 {
            let mut rgb = [200u8; 3];
            renderer.wetness_overlay(&mut rgb, &dry);
            assert_eq!(rgb, [200, 200, 200]);
        }
    }

    #[test]
    fn tick_phase_resets_inner_cycle_on_wrap() {
        let mut renderer = WetRenderer::new(RenderOptions { show_wetness: true });
        let mut wet = WetPack::default();
        wet.paint.w = 400;
        // Advance the inner phase off zero.
        let mut rgb = [200u8; 3];
        renderer.wetness_overlay(&mut rgb, &wet);
        assert_ne!(renderer.phase, 0);
        // Three ticks: phase_big 1→2→3, inner phase untouched.
        for _ in 0..3 {
            renderer.tick_phase();
        }
        assert_ne!(renderer.phase, 0);
        // Fourth tick wraps phase_big to 0 and resets the shimmer cycle.
        renderer.tick_phase();
        assert_eq!(renderer.phase, 0);
    }

    #[test]
    fn full_render_of_blank_canvas_is_white() {
        let canvas = WetCanvas::new(8, 4);
        let mut renderer = WetRenderer::new(RenderOptions::default());
        let img = renderer.render(&canvas);
        assert_eq!(img.dimensions(), (8, 4));
        for p in img.pixels() {
            assert_eq!(p.0, [255, 255, 255, 255]);
        }
    }
}
