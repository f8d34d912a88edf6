// ============================================================================
// PAPER TEXTURE — random height field + horizontal IIR blur
// ============================================================================
//
// Primes the paper substrate before any painting happens: a uniform random
// height per pixel around the nominal 128, then a one-dimensional
// exponential low-pass left-to-right so the grain reads as fiber rather
// than static. The filtered height lands in both sub-records, so the
// mobile paint layer and the adsorbed layer see the same topography.
//
// There is no vertical blur pass; the horizontal-only grain is part of
// the look.

use rand::Rng;

use crate::canvas::{WetCanvas, WetRect};

/// Texture generator parameters.
#[derive(Clone, Copy, Debug)]
pub struct TextureOptions {
    /// Grain amplitude: raw heights are drawn from `128 + 128·height·U`,
    /// `U` uniform in [0, 1). 1.0 is nominal paper.
    pub height: f64,
    /// IIR blur coefficient in [0, 1); 0 disables smoothing.
    pub blur: f64,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self { height: 1.0, blur: 0.7 }
    }
}

/// Generate paper grain over `rect`. Mutates only the `h` field of both
/// sub-records; pigment and water are untouched. Deterministic given the
/// RNG stream.
pub fn prime_paper<R: Rng>(
    canvas: &mut WetCanvas,
    rect: WetRect,
    opts: &TextureOptions,
    rng: &mut R,
) {
    let rect = rect.intersect(&canvas.full_rect());
    if rect.is_empty() {
        return;
    }

    // Pass 1: raw random heights into the adsorbed layer.
    for y in rect.y..rect.bottom() {
        for pack in canvas.row_mut(y, rect.x, rect.right()) {
            let u: f64 = rng.random();
            let h = (128.0 + 128.0 * opts.height * u + 0.5).floor();
            pack.adsorb.h = h.clamp(0.0, 65535.0) as u16;
        }
    }

    // Pass 2: per-row integer low-pass, left to right. The first pixel of
    // a row has no left neighbor and passes through unfiltered. The
    // filtered height is mirrored into the paint layer.
    let blur_weight = (256.0 * opts.blur + 0.5).floor() as i32;
    for y in rect.y..rect.bottom() {
        let row = canvas.row_mut(y, rect.x, rect.right());
        let mut lh = row[0].adsorb.h as i32;
        row[0].paint.h = row[0].adsorb.h;
        for pack in &mut row[1..] {
            let mut h = pack.adsorb.h as i32;
            h += ((lh - h) * blur_weight + 128) >> 8;
            lh = h;
            pack.adsorb.h = h as u16;
            pack.paint.h = h as u16;
        }
    }

    canvas.mark_dirty(Some(rect));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Replays a fixed list of u64 draws; wraps around at the end.
    struct StreamRng {
        values: Vec<u64>,
        pos: usize,
    }

    impl StreamRng {
        fn new(values: Vec<u64>) -> Self {
            Self { values, pos: 0 }
        }
    }

    impl RngCore for StreamRng {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }
        fn next_u64(&mut self) -> u64 {
            let v = self.values[self.pos % self.values.len()];
            self.pos += 1;
            v
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest.iter_mut() {
                *b = self.next_u64() as u8;
            }
        }
    }

    /// A u64 whose f64 mapping is exactly 0.5 (rand uses the top 53 bits).
    const HALF: u64 = 1 << 63;

    fn full(canvas: &WetCanvas) -> WetRect {
        canvas.full_rect()
    }

    #[test]
    fn constant_stream_yields_flat_filtered_field() {
        // U = 0.5 everywhere: every raw height is round(128 + 64) = 192 and
        // the low-pass is the identity on a flat row.
        let mut canvas = WetCanvas::new(5, 1);
        let mut rng = StreamRng::new(vec![HALF]);
        let __rect = full(&canvas);
        prime_paper(&mut canvas, __rect, &TextureOptions::default(), &mut rng);
        for x in 0..5 {
            assert_eq!(canvas.at(x, 0).adsorb.h, 192);
            assert_eq!(canvas.at(x, 0).paint.h, 192);
        }
    }

    #[test]
    fn blur_recurrence_matches_closed_form() {
        // Alternating draws 0, 0.5, 0, 0.5, 0 give raw heights
        // [128, 192, 128, 192, 128]. With blur 0.7 the integer weight is
        // floor(256·0.7 + 0.5) = 179, and the recurrence
        //   h += ((lh − h)·179 + 128) >> 8
        // produces 147, 141, 156, 148 for the four filtered pixels.
        let mut canvas = WetCanvas::new(5, 1);
        let mut rng = StreamRng::new(vec![0, HALF, 0, HALF, 0]);
        let __rect = full(&canvas);
        prime_paper(&mut canvas, __rect, &TextureOptions::default(), &mut rng);
        let expected = [128u16, 147, 141, 156, 148];
        for (x, &h) in expected.iter().enumerate() {
            assert_eq!(canvas.at(x as u32, 0).adsorb.h, h, "column {}", x);
            assert_eq!(canvas.at(x as u32, 0).paint.h, h, "column {}", x);
        }
    }

    #[test]
    fn identical_seeds_produce_identical_fields() {
        let opts = TextureOptions::default();
        let mut a = WetCanvas::new(16, 16);
        let mut b = WetCanvas::new(16, 16);
        let __rect = full(&a);
        prime_paper(&mut a, __rect, &opts, &mut StdRng::seed_from_u64(7));
        let __rect = full(&b);
        prime_paper(&mut b, __rect, &opts, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn color_fields_are_untouched() {
        let mut canvas = WetCanvas::new(4, 4);
        canvas.at_mut(1, 1).paint.rd = 777;
        canvas.at_mut(2, 2).adsorb.gw = 555;
        let mut rng = StdRng::seed_from_u64(1);
        let __rect = full(&canvas);
        prime_paper(&mut canvas, __rect, &TextureOptions::default(), &mut rng);
        assert_eq!(canvas.at(1, 1).paint.rd, 777);
        assert_eq!(canvas.at(2, 2).adsorb.gw, 555);
        assert_eq!(canvas.at(1, 1).paint.w, 0);
    }
}
