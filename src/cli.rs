// ============================================================================
// aquarelle CLI — headless watercolor simulation renderer
// ============================================================================
//
// Usage examples:
//   aquarelle --output wash.png
//   aquarelle --stroke "60,60:450,420" --color "cadmium red" --ticks 200
//   aquarelle --size 800x600 --seed 7 --flow --stroke "80,80:720,520"
//   aquarelle --color 1a0a8f --wetness 320 --show-wetness
//
// No GUI, no window: strokes are deposited, the physics runs, and the
// composited canvas is written out as a PNG.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::canvas::WetCanvas;
use crate::ops::brush::{BrushPaint, WetBrush};
use crate::{log_err, log_info};
use crate::ops::physics::{PhysicsOptions, WetPhysics};
use crate::palette;
use crate::render::{RenderOptions, WetRenderer};
use crate::texture::{prime_paper, TextureOptions};
use crate::wetpix::WetPixel;

/// Physics ticks interleaved into a stroke: one tick per this many dabs,
/// so long strokes already start to bleed while they are being drawn.
const DABS_PER_TICK: u32 = 8;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Headless watercolor painter.
///
/// Deposit wet brush strokes, run the water/pigment simulation and render
/// the result to a PNG — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "aquarelle",
    about = "Headless watercolor simulation renderer",
    long_about = "Paint wet strokes onto simulated paper, let the water flow, dry and\n\
                  adsorb, then composite the canvas to a PNG.\n\n\
                  Example:\n  \
                  aquarelle --stroke \"60,60:450,420\" --color \"french ultramarine\" -o wash.png\n  \
                  aquarelle --size 800x600 --seed 7 --flow --show-wetness"
)]
pub struct CliArgs {
    /// Canvas size as WxH (e.g. 512x512).
    #[arg(long, default_value = "512x512", value_name = "WxH")]
    pub size: String,

    /// Seed for paper grain and brush dither. Same seed, same picture.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Brush stroke as a line segment "x0,y0:x1,y1". Repeatable; strokes
    /// are painted in order. Without any, a small demo composition is
    /// painted.
    #[arg(long = "stroke", value_name = "X0,Y0:X1,Y1")]
    pub strokes: Vec<String>,

    /// Brush color: a paintbox name (see --list-colors) or RRGGBB hex.
    #[arg(long, default_value = "french ultramarine")]
    pub color: String,

    /// List the paintbox color names and exit.
    #[arg(long)]
    pub list_colors: bool,

    /// Brush core radius in pixels.
    #[arg(long, default_value_t = 10.0)]
    pub radius: f64,

    /// Water charge of the brush, raw units (0–511).
    #[arg(long, default_value_t = 240.0)]
    pub wetness: f64,

    /// Brush strength; 1.0 nominal, 2.0 maximum.
    #[arg(long, default_value_t = 1.0)]
    pub strength: f64,

    /// Simulation ticks to run after the last stroke.
    #[arg(long, default_value_t = 90)]
    pub ticks: u32,

    /// Enable the lateral flow pass (off by default).
    #[arg(long)]
    pub flow: bool,

    /// Overlay the wetness shimmer visualization on the output.
    #[arg(long)]
    pub show_wetness: bool,

    /// Paper grain amplitude (1.0 nominal).
    #[arg(long, default_value_t = 1.0)]
    pub paper_height: f64,

    /// Paper grain blur coefficient in [0, 1).
    #[arg(long, default_value_t = 0.7)]
    pub paper_blur: f64,

    /// Output PNG path.
    #[arg(short, long, default_value = "aquarelle.png", value_name = "FILE")]
    pub output: PathBuf,

    /// Print per-phase timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the whole pipeline and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    if args.list_colors {
        for name in palette::preset_names() {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }
    match run_inner(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), String> {
    let (width, height) = parse_size(&args.size)?;
    let pigment = resolve_pigment(&args.color)?;
    let strokes = if args.strokes.is_empty() {
        demo_strokes(width, height)
    } else {
        args.strokes
            .iter()
            .map(|s| parse_stroke(s))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut canvas = WetCanvas::new(width, height);
    let mut physics = WetPhysics::new(PhysicsOptions { flow_enabled: args.flow });
    let mut renderer = WetRenderer::new(RenderOptions { show_wetness: args.show_wetness });
    let brush = WetBrush::new(args.radius);
    let paint = BrushPaint::new(pigment, args.wetness, args.strength);
    let full = canvas.full_rect();

    // -- Step 1: paper ---------------------------------------------------
    let start = Instant::now();
    prime_paper(
        &mut canvas,
        full,
        &TextureOptions { height: args.paper_height, blur: args.paper_blur },
        &mut rng,
    );
    log_info!("paper primed ({}x{})", width, height);
    if args.verbose {
        println!("paper    {:>6.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    // -- Step 2: strokes -------------------------------------------------
    let start = Instant::now();
    let mut dabs = 0u32;
    for &((x0, y0), (x1, y1)) in &strokes {
        // One dab per pixel of stroke length, pressure swelling and
        // fading sinusoidally from end to end.
        let steps = ((x1 - x0).hypot(y1 - y0).ceil() as u32).max(1);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let pressure = (std::f64::consts::PI * t).sin();
            brush.paint_at(
                &mut canvas,
                x0 + (x1 - x0) * t,
                y0 + (y1 - y0) * t,
                pressure,
                &paint,
                &mut rng,
            );
            dabs += 1;
            if dabs % DABS_PER_TICK == 0 {
                physics.tick(&mut canvas, full);
            }
        }
    }
    log_info!("{} strokes, {} dabs", strokes.len(), dabs);
    if args.verbose {
        println!("strokes  {:>6.1}ms", start.elapsed().as_secs_f64() * 1000.0);
    }

    // -- Step 3: simulation ----------------------------------------------
    let start = Instant::now();
    for _ in 0..args.ticks {
        physics.tick(&mut canvas, full);
        if args.show_wetness {
            renderer.tick_phase();
        }
    }
    if args.verbose {
        println!("ticks    {:>6.1}ms ({} ticks)", start.elapsed().as_secs_f64() * 1000.0, args.ticks);
    }

    // -- Step 4: composite + save ----------------------------------------
    let start = Instant::now();
    let img = renderer.render(&canvas);
    img.save(&args.output)
        .map_err(|e| format!("could not write '{}': {}", args.output.display(), e))?;
    log_info!("wrote {}", args.output.display());
    if args.verbose {
        println!("render   {:>6.1}ms", start.elapsed().as_secs_f64() * 1000.0);
        println!("→ {}", args.output.display());
    }

    Ok(())
}

// ============================================================================
// Argument parsing helpers
// ============================================================================

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{}': expected WxH, e.g. 512x512", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if w == 0 || h == 0 {
        return Err("canvas size must be at least 1x1".to_string());
    }
    Ok((w, h))
}

type Stroke = ((f64, f64), (f64, f64));

fn parse_stroke(s: &str) -> Result<Stroke, String> {
    let err = || format!("invalid stroke '{}': expected \"x0,y0:x1,y1\"", s);
    let (a, b) = s.split_once(':').ok_or_else(err)?;
    let parse_point = |p: &str| -> Result<(f64, f64), String> {
        let (x, y) = p.split_once(',').ok_or_else(err)?;
        let x: f64 = x.trim().parse().map_err(|_| err())?;
        let y: f64 = y.trim().parse().map_err(|_| err())?;
        Ok((x, y))
    };
    Ok((parse_point(a)?, parse_point(b)?))
}

/// Brush color from a paintbox name or an RRGGBB hex triplet.
fn resolve_pigment(color: &str) -> Result<WetPixel, String> {
    if let Some(pigment) = palette::preset_pigment(color) {
        return Ok(pigment);
    }
    let hex = color.trim().trim_start_matches('#');
    if hex.len() == 6
        && let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        )
    {
        return Ok(palette::pigment_from_rgb([r, g, b], palette::DEFAULT_TINTING));
    }
    Err(format!(
        "unknown color '{}': expected RRGGBB hex or one of: {}",
        color,
        palette::preset_names().join(", ")
    ))
}

/// Two crossing washes, scaled to the canvas — painted when no --stroke
/// is given so a bare invocation still produces something to look at.
fn demo_strokes(width: u32, height: u32) -> Vec<Stroke> {
    let (w, h) = (width as f64, height as f64);
    vec![
        ((w * 0.15, h * 0.20), (w * 0.85, h * 0.70)),
        ((w * 0.20, h * 0.75), (w * 0.80, h * 0.30)),
    ]
}

// ============================================================================
// Tests
// ============================================================================
