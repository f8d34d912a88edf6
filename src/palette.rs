// ============================================================================
// WATERCOLOR PALETTE — named paints and RGB → pigment derivation
// ============================================================================
//
// A paint is described per channel by an optical density `d` (how strongly
// it absorbs) and a myth concentration `w` (what it reflects once light
// stops getting through). `pigment_from_rgb` inverts the compositor's
// single-layer-over-white formula so a thick or repeatedly-built-up layer
// converges toward the requested color while thin washes stay pale — which
// is exactly how the medium behaves.

use crate::wetpix::{WetPixel, WetPixelDouble};

/// Default tinting strength for derived pigments. Higher values reach the
/// masstone color in fewer passes.
pub const DEFAULT_TINTING: f64 = 4.0;

/// Floor for the per-channel reflectance before taking the log; keeps the
/// density finite for fully-absorbed channels.
const REFLECTANCE_FLOOR: f64 = 0.02;

/// Derive a wet pigment from an sRGB color. Per channel the masstone
/// reflectance is the channel value itself and the density scales with how
/// dark the channel is:
///
///   d = tinting · (−ln(max(c, 0.02)) / ln(50))
///   w = c · d
///
/// so `w/d = c` and compositing an opaque layer lands on the requested
/// color.
pub fn pigment_from_rgb(rgb: [u8; 3], tinting: f64) -> WetPixel {
    let norm = REFLECTANCE_FLOOR.ln().abs(); // ln(50)
    let mut ch = [0.0f64; 6];
    for (i, &v) in rgb.iter().enumerate() {
        let c = v as f64 / 255.0;
        let d = tinting * (-(c.max(REFLECTANCE_FLOOR)).ln()) / norm;
        ch[i * 2] = d;
        ch[i * 2 + 1] = c * d;
    }
    WetPixel::from_double(&WetPixelDouble {
        rd: ch[0],
        rw: ch[1],
        gd: ch[2],
        gw: ch[3],
        bd: ch[4],
        bw: ch[5],
        w: 0.0,
        h: 0.0,
    })
}

/// An opaque white: equal density and myth in every channel, so the layer
/// reflects fully instead of letting the ground through.
fn titanium_white() -> WetPixel {
    WetPixel::from_double(&WetPixelDouble {
        rd: 0.6,
        rw: 0.6,
        gd: 0.6,
        gw: 0.6,
        bd: 0.6,
        bw: 0.6,
        w: 0.0,
        h: 0.0,
    })
}

/// Paintbox entries. The names (and rough hues) follow the classic
/// watercolor paintbox; the pigment numbers are derived from the crate's
/// own compositing model.
const PRESET_COLORS: &[(&str, [u8; 3])] = &[
    ("quinacridone rose", [233, 73, 126]),
    ("indian red", [205, 92, 92]),
    ("cadmium yellow", [255, 153, 0]),
    ("hansa yellow", [252, 211, 0]),
    ("cadmium red", [227, 0, 34]),
    ("brilliant orange", [255, 110, 26]),
    ("hookers green", [33, 95, 61]),
    ("phthalo green", [18, 83, 56]),
    ("cerulean blue", [42, 82, 190]),
    ("french ultramarine", [18, 10, 143]),
    ("burnt umber", [138, 51, 36]),
    ("ivory black", [35, 32, 30]),
];

/// Look up a paintbox pigment by name (case-insensitive). `titanium
/// white` and `pure water` are special entries: the first is opaque, the
/// second carries no pigment at all and only wets the paper.
pub fn preset_pigment(name: &str) -> Option<WetPixel> {
    let key = name.trim().to_ascii_lowercase();
    match key.as_str() {
        "titanium white" => return Some(titanium_white()),
        "pure water" => return Some(WetPixel::default()),
        _ => {}
    }
    PRESET_COLORS
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, rgb)| pigment_from_rgb(*rgb, DEFAULT_TINTING))
}

/// All paintbox names, for CLI help and error messages.
pub fn preset_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PRESET_COLORS.iter().map(|(n, _)| *n).collect();
    names.push("titanium white");
    names.push("pure water");
    names
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn darker_channels_absorb_more() {
        let pig = pigment_from_rgb([227, 0, 34], DEFAULT_TINTING);
        // Cadmium red: green fully absorbed, red barely.
        assert!(pig.gd > pig.rd);
        assert!(pig.gd > pig.bd);
        // Fully-dark channel has (near) zero myth.
        assert_eq!(pig.gw, 0);
        assert!(pig.rw > 0);
    }

    #[test]
    fn white_derivation_is_nearly_clear() {
        let pig = pigment_from_rgb([255, 255, 255], DEFAULT_TINTING);
        assert_eq!(pig.rd, 0);
        assert_eq!(pig.gd, 0);
        assert_eq!(pig.bd, 0);
    }

    #[test]
    fn myth_never_exceeds_density() {
        for &(_, rgb) in PRESET_COLORS {
            let pig = pigment_from_rgb(rgb, DEFAULT_TINTING);
            assert!(pig.rw <= pig.rd, "{:?}", rgb);
            assert!(pig.gw <= pig.gd, "{:?}", rgb);
            assert!(pig.bw <= pig.bd, "{:?}", rgb);
        }
    }

    #[test]
    fn preset_lookup_is_case_insensitive() {
        assert!(preset_pigment("French Ultramarine").is_some());
        assert!(preset_pigment("  HOOKERS GREEN ").is_some());
        assert!(preset_pigment("neon slime").is_none());
        let water = preset_pigment("Pure Water").unwrap();
        assert_eq!(water, WetPixel::default());
    }

    #[test]
    fn every_preset_name_resolves() {
        for name in preset_names() {
            assert!(preset_pigment(name).is_some(), "{}", name);
        }
    }
}
