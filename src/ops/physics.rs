// ============================================================================
// WET PHYSICS — flow, drying and adsorption over a pixel region
// ============================================================================
//
// Three processes evolve a wet canvas between paint strokes:
//
//   Flow    — water (and the pigment suspended in it) moves laterally
//             between neighboring pixels, driven by differences in
//             surface height + water column. Five-point stencil over the
//             region interior; the outermost ring is never written.
//   Dry     — water evaporates one raw unit per pass.
//   Adsorb  — a fraction of the suspended pigment binds into the paper
//             layer underneath. Pigment only ever moves paint → adsorb.
//
// The engine runs Adsorb + Dry every third tick. Flow is a policy
// switch, off by default: adsorption and drying alone give the classic
// settled-wash look, and hosts that want live bleeding opt in per
// engine.
//
// All flow scratch state lives in per-invocation Vecs sized to the
// region; nothing survives between ticks.

use crate::canvas::{WetCanvas, WetRect};
use crate::wetpix::{WetPixel, WetPixelDouble};

/// Below this optical density a layer is treated as contributing nothing
/// to a channel merge; it also keeps the merge formula clear of its
/// division-by-near-zero region.
const MERGE_EPSILON: f64 = 1e-4;

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct PhysicsOptions {
    /// Run the lateral flow pass each tick. Off by default.
    pub flow_enabled: bool,
}

/// Tick-cycle state machine. Drive `tick` once per simulation step from
/// whatever clock the host has; every third call performs adsorption
/// followed by drying.
pub struct WetPhysics {
    tick_count: u8,
    pub options: PhysicsOptions,
}

impl WetPhysics {
    pub fn new(options: PhysicsOptions) -> Self {
        Self { tick_count: 0, options }
    }

    pub fn tick(&mut self, canvas: &mut WetCanvas, rect: WetRect) {
        if self.options.flow_enabled {
            flow(canvas, rect);
        }
        if self.tick_count == 2 {
            adsorb(canvas, rect);
            dry(canvas, rect);
            self.tick_count = 0;
        } else {
            self.tick_count += 1;
        }
    }
}

// ============================================================================
// Flow pass
// ============================================================================

/// Directional flow fraction from the height potentials toward a neighbor
/// and toward its opposite.
fn flow_fraction(toward: f64, opposite: f64) -> f64 {
    (0.1 * (10.0 + 0.75 * toward - 0.25 * opposite)).clamp(0.0, 1.0)
}

/// Surface potential of a mobile-layer pixel: paper height plus water
/// column, in raw fixed-point units.
#[inline]
fn potential(p: &WetPixel) -> f64 {
    p.h as f64 + p.w as f64
}

/// Lateral diffusion over the interior of `rect`. Needs at least a 3×3
/// region (the stencil wants one ring of margin); smaller regions are a
/// no-op. Neighbor reads come from a snapshot taken before any write, so
/// the pass sees a consistent pre-tick state throughout.
pub fn flow(canvas: &mut WetCanvas, rect: WetRect) {
    let rect = rect.intersect(&canvas.full_rect());
    if rect.width < 3 || rect.height < 3 {
        return;
    }
    let (rw, rh) = (rect.width as usize, rect.height as usize);

    // Pre-tick snapshot of the mobile layer.
    let mut snap: Vec<WetPixel> = Vec::with_capacity(rw * rh);
    for y in rect.y..rect.bottom() {
        snap.extend(canvas.row(y, rect.x, rect.right()).iter().map(|p| p.paint));
    }

    let mut flow_t = vec![0.0f64; rw * rh];
    let mut flow_b = vec![0.0f64; rw * rh];
    let mut flow_l = vec![0.0f64; rw * rh];
    let mut flow_r = vec![0.0f64; rw * rh];
    let mut fluid = vec![0.0f64; rw * rh];
    let mut outflow = vec![0.0f64; rw * rh];

    // Step 1: deposit fluid potentials. Each wet interior pixel computes
    // how much of each neighbor it is inclined to draw in, from the
    // height+water gradient toward that neighbor (tempered by the
    // gradient on the opposite side).
    for y in 1..rh - 1 {
        for x in 1..rw - 1 {
            let i = y * rw + x;
            let p = &snap[i];
            if p.w == 0 {
                continue;
            }
            let height = potential(p);
            let ft = potential(&snap[i - rw]) - height;
            let fb = potential(&snap[i + rw]) - height;
            let fl = potential(&snap[i - 1]) - height;
            let fr = potential(&snap[i + 1]) - height;
            fluid[i] = 0.4 * (p.w as f64 / 255.0).sqrt();
            flow_t[i] = flow_fraction(ft, fb);
            flow_b[i] = flow_fraction(fb, ft);
            flow_l[i] = flow_fraction(fl, fr);
            flow_r[i] = flow_fraction(fr, fl);
            outflow[i] = 0.0;
        }
    }

    // Step 2: damp each draw by the fluidity on both ends — flow through
    // dry paper dies off — and charge the drawn amount to the donating
    // neighbor's outflow account.
    for y in 1..rh - 1 {
        for x in 1..rw - 1 {
            let i = y * rw + x;
            if snap[i].w == 0 {
                continue;
            }
            flow_t[i] *= fluid[i] * fluid[i - rw];
            flow_b[i] *= fluid[i] * fluid[i + rw];
            flow_l[i] *= fluid[i] * fluid[i - 1];
            flow_r[i] *= fluid[i] * fluid[i + 1];
            outflow[i - rw] += flow_t[i];
            outflow[i + rw] += flow_b[i];
            outflow[i - 1] += flow_l[i];
            outflow[i + 1] += flow_r[i];
        }
    }

    // Step 3: combine. Each wet interior pixel keeps what it did not give
    // away and receives the drawn fractions of its four neighbors, water
    // diluting along with pigment. Paper height stays put.
    for y in 1..rh - 1 {
        for x in 1..rw - 1 {
            let i = y * rw + x;
            let p = &snap[i];
            if p.w == 0 {
                continue;
            }
            let center = p.to_double();
            let mut acc = center.reduce(1.0 - outflow[i]);
            acc.accumulate(&snap[i - rw].to_double().reduce(flow_t[i]));
            acc.accumulate(&snap[i + rw].to_double().reduce(flow_b[i]));
            acc.accumulate(&snap[i - 1].to_double().reduce(flow_l[i]));
            acc.accumulate(&snap[i + 1].to_double().reduce(flow_r[i]));
            acc.h = center.h;
            canvas.at_mut(rect.x + x as u32, rect.y + y as u32).paint =
                WetPixel::from_double(&acc);
        }
    }

    canvas.mark_dirty(Some(rect));
}

// ============================================================================
// Dry pass
// ============================================================================

/// Evaporate one raw unit of water from the mobile layer of every pixel
/// in `rect`. Already-dry pixels stay at zero.
pub fn dry(canvas: &mut WetCanvas, rect: WetRect) {
    let rect = rect.intersect(&canvas.full_rect());
    if rect.is_empty() {
        return;
    }
    for y in rect.y..rect.bottom() {
        for pack in canvas.row_mut(y, rect.x, rect.right()) {
            pack.paint.w = pack.paint.w.saturating_sub(1);
        }
    }
    canvas.mark_dirty(Some(rect));
}

// ============================================================================
// Adsorb pass
// ============================================================================

/// Bind a fraction of the suspended pigment into the paper layer. The
/// fraction is inversely proportional to the remaining water — pigment in
/// a nearly-dry wash settles fast. Dry pixels are skipped entirely; their
/// pigment neither settles nor decays.
pub fn adsorb(canvas: &mut WetCanvas, rect: WetRect) {
    let rect = rect.intersect(&canvas.full_rect());
    if rect.is_empty() {
        return;
    }
    for y in rect.y..rect.bottom() {
        for pack in canvas.row_mut(y, rect.x, rect.right()) {
            let pw = pack.paint.w;
            if pw == 0 {
                continue;
            }
            let ads = 0.5 / pw.max(1) as f64;
            let paint = pack.paint.to_double();
            let bound = pack.adsorb.to_double();
            let merged = merge_pixel(&paint, ads, &bound);
            pack.adsorb.set_colors_from(&merged);
            pack.paint.set_colors_from(&paint.dilute(1.0 - ads));
        }
    }
    canvas.mark_dirty(Some(rect));
}

// ============================================================================
// Kubelka-Munk channel merge
// ============================================================================

/// Merge `src1` (scaled by `dilution1`) optically on top of `src2`,
/// channel by channel. Water and height come from `src2`; the merge is a
/// statement about pigment, not about the water column.
pub fn merge_pixel(
    src1: &WetPixelDouble,
    dilution1: f64,
    src2: &WetPixelDouble,
) -> WetPixelDouble {
    let (rd, rw) = merge_channel(src1.rd, src1.rw, dilution1, src2.rd, src2.rw);
    let (gd, gw) = merge_channel(src1.gd, src1.gw, dilution1, src2.gd, src2.gw);
    let (bd, bw) = merge_channel(src1.bd, src1.bw, dilution1, src2.bd, src2.bw);
    WetPixelDouble { rd, rw, gd, gw, bd, bw, w: src2.w, h: src2.h }
}

/// One channel of the merge: sequential light absorption through two
/// stacked translucent layers of differing optical density. The epsilon
/// branches keep the general formula away from its 0/0 region and make
/// the degenerate cases exact.
pub fn merge_channel(d1: f64, w1: f64, dilution1: f64, d2: f64, w2: f64) -> (f64, f64) {
    if d1 < MERGE_EPSILON {
        return (d2, w2);
    }
    if d2 < MERGE_EPSILON {
        return (d1 * dilution1, w1);
    }
    let d = d1 * dilution1 + d2;
    let ed1 = (-(d1 * dilution1)).exp();
    let ed2 = (-d2).exp();
    let w = d * ((1.0 - ed1) * w1 / d1 + ed1 * (1.0 - ed2) * w2 / d2) / (1.0 - ed1 * ed2);
    (d, w)
}

// ============================================================================
// Tests
// ============================================================================
