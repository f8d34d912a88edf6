// ============================================================================
// BRUSH DEPOSITION — circular wet-paint dab with contact gating
// ============================================================================
//
// A dab deposits pigment and water into the mobile layer inside a
// circular footprint. How strongly each pixel takes the paint depends on
// "contact": stylus pressure inside the brush core, plus how wet and how
// tall the paper already is. Outside the core, contact can still arise
// from a soaked substrate, which is what produces the soft fringe of a
// wet-on-wet stroke.
//
// Each deposited field gets its own fresh uniform dither draw; flat
// fills come out with a slight grain instead of banding.

use rand::Rng;

use crate::canvas::{WetCanvas, WetRect};
use crate::wetpix::{WetPack, WetPixel};

/// Contact below this threshold deposits nothing at all; the destination
/// pixel is left bit-for-bit unchanged.
const CONTACT_THRESHOLD: f64 = 0.0001;

/// Expected default paper height (raw units): the nominal 128 plus half
/// the default grain amplitude. The contact formula measures the
/// substrate relative to this level.
const PAPER_BIAS: f64 = 192.0;

// ============================================================================
// Brush color
// ============================================================================

/// A loaded brush: pigment plus the water charge and strength knobs.
///
/// Hosts that store brush colors as wet packs encode `wetness` and
/// `strength` by overloading the `w` and `h` fields of the source color —
/// a pixel that was never really a pixel. Here they are explicit
/// parameters; `from_pack` converts from the packed convention at the
/// boundary.
#[derive(Clone, Copy, Debug)]
pub struct BrushPaint {
    /// Pigment concentrations. Only the six color fields are read.
    pub pigment: WetPixel,
    /// Water charge deposited with the pigment, raw fixed-point units.
    pub wetness: f64,
    /// Stroke strength; 1.0 is nominal, 2.0 the packed-format maximum.
    pub strength: f64,
}

impl BrushPaint {
    pub fn new(pigment: WetPixel, wetness: f64, strength: f64) -> Self {
        Self { pigment, wetness, strength }
    }

    /// Decode a packed source color that carries brush parameters in its
    /// substance fields: water volume is the wetness, and the height
    /// field maps [0, 65535] onto a strength of [0, 2].
    pub fn from_pack(pack: &WetPack) -> Self {
        Self {
            pigment: pack.paint,
            wetness: pack.paint.w as f64,
            strength: 2.0 * pack.paint.h as f64 / 65535.0,
        }
    }
}

// ============================================================================
// Brush
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct WetBrush {
    /// Core radius in pixels. Contact from substrate wetness extends one
    /// pixel further (the fringe).
    pub radius: f64,
}

impl Default for WetBrush {
    fn default() -> Self {
        Self { radius: 10.0 }
    }
}

impl WetBrush {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Deposit one dab at `(x, y)` with the given stylus pressure.
    /// Returns the touched (dirtied) rectangle, or `None` when the
    /// footprint misses the canvas entirely.
    pub fn paint_at<R: Rng>(
        &self,
        canvas: &mut WetCanvas,
        x: f64,
        y: f64,
        pressure: f64,
        paint: &BrushPaint,
        rng: &mut R,
    ) -> Option<WetRect> {
        let r = self.radius;
        // Pressure sharpens the stroke quadratically around the nominal
        // strength.
        let strength = paint.strength * (paint.strength + pressure) * 0.5;

        let rect = WetRect::from_bounds(
            (x - r - 1.0).floor() as i64,
            (y - r - 1.0).floor() as i64,
            (x + r + 1.0).ceil() as i64,
            (y + r + 1.0).ceil() as i64,
            canvas.width(),
            canvas.height(),
        );
        if rect.is_empty() {
            return None;
        }

        for yp in rect.y..rect.bottom() {
            for xp in rect.x..rect.right() {
                let dx = xp as f64 + 0.5 - x;
                let dy = yp as f64 + 0.5 - y;
                let rr = dx * dx + dy * dy;
                // Inside the core the stylus presses the bristles down;
                // outside, only a wet or raised substrate makes contact.
                let press = if rr < r * r { 0.25 * pressure } else { -1.0 };

                let pack = canvas.at_mut(xp, yp);
                let eff_height =
                    (pack.adsorb.h as f64 + pack.paint.w as f64 - PAPER_BIAS) / 255.0;
                let mut contact = 0.2 * (press + eff_height);
                if contact > 0.5 {
                    contact = 1.0 - 0.5 * (-(2.0 * contact - 1.0)).exp();
                }
                if contact <= CONTACT_THRESHOLD {
                    continue;
                }

                let dst = &mut pack.paint;
                deposit_field(&mut dst.rd, paint.pigment.rd as f64 * strength, contact, rng);
                deposit_field(&mut dst.rw, paint.pigment.rw as f64 * strength, contact, rng);
                deposit_field(&mut dst.gd, paint.pigment.gd as f64 * strength, contact, rng);
                deposit_field(&mut dst.gw, paint.pigment.gw as f64 * strength, contact, rng);
                deposit_field(&mut dst.bd, paint.pigment.bd as f64 * strength, contact, rng);
                deposit_field(&mut dst.bw, paint.pigment.bw as f64 * strength, contact, rng);
                deposit_field(&mut dst.w, paint.wetness * strength, contact, rng);
            }
        }

        canvas.mark_dirty(Some(rect));
        Some(rect)
    }
}

/// Blend one raw field toward the brush target, with a fresh dither draw.
fn deposit_field<R: Rng>(field: &mut u16, target: f64, contact: f64, rng: &mut R) {
    let old = *field as f64;
    let dither: f64 = rng.random();
    let v = (old + (target - old) * contact + dither).floor();
    *field = v.clamp(0.0, 65535.0) as u16;
}

// ============================================================================
// Tests
// ============================================================================
