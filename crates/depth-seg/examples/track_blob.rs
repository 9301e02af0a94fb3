//! Example: converge tracked points on a synthetic depth frame.
//!
//! Renders a flat wall with two "hands" (elliptical blobs nearer than the
//! wall), runs the convergence loop for an active point seeded off-centre,
//! then enumerates leftover foreground candidates and tracks each of them as
//! a passive point. Results are printed as JSON; timing goes to stdout.
//!
//! Run from the workspace root:
//!   cargo run -p depth-seg --example track_blob -- --help
//!   cargo run -p depth-seg --example track_blob

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use depth_seg::{
    DepthFrame, Image, PinholeConversion, Pixel, PixelType, ScoreConfig, SegmentationState,
    SegmentationTracker, TrackedPointType, TrackingContext, calculate_basic_score,
    calculate_segment_area, find_foreground_pixel,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Track hand-like blobs on a synthetic depth frame")]
struct Args {
    #[arg(long, default_value_t = 160)]
    width: usize,

    #[arg(long, default_value_t = 120)]
    height: usize,

    /// Downsampling factor back to the sensor's 320x240 reference grid
    #[arg(long, default_value_t = 2.0)]
    resize_factor: f32,

    /// Depth of the background wall, in millimetres
    #[arg(long, default_value_t = 2400.0)]
    wall_depth: f32,

    /// Depth of the blobs, in millimetres
    #[arg(long, default_value_t = 850.0)]
    blob_depth: f32,

    #[arg(long, default_value_t = 150.0)]
    bandwidth: f32,

    #[arg(long, default_value_t = 10)]
    iteration_max: usize,
}

#[derive(Serialize)]
struct TrackDto {
    kind: &'static str,
    seed: [i64; 2],
    point: [i64; 2],
    iterations: usize,
    stop: String,
    elapsed_ms: f64,
}

#[derive(Serialize)]
struct ReportDto {
    width: usize,
    height: usize,
    segmented_pixels: usize,
    tracks: Vec<TrackDto>,
}

fn synthetic_depth(args: &Args) -> Result<Image<f32>> {
    let blobs = [
        (0.35 * args.width as f32, 0.45 * args.height as f32),
        (0.7 * args.width as f32, 0.4 * args.height as f32),
    ];
    let (rx, ry) = (0.08 * args.width as f32, 0.16 * args.height as f32);

    let mut data = Vec::with_capacity(args.width * args.height);
    for y in 0..args.height {
        for x in 0..args.width {
            let inside = blobs.iter().any(|&(cx, cy)| {
                let dx = (x as f32 - cx) / rx;
                let dy = (y as f32 - cy) / ry;
                dx * dx + dy * dy <= 1.0
            });
            data.push(if inside { args.blob_depth } else { args.wall_depth });
        }
    }
    Image::from_vec(args.width, args.height, data).context("building synthetic depth")
}

fn coords(p: Option<Pixel>) -> [i64; 2] {
    let (x, y) = Pixel::coords_or_invalid(p);
    [x, y]
}

fn main() -> Result<()> {
    let args = Args::parse();

    let depth = synthetic_depth(&args)?;
    let conv = PinholeConversion::default();
    let area = calculate_segment_area(&depth, &conv, args.resize_factor);
    let score_cfg = ScoreConfig {
        resize_factor: args.resize_factor,
        ..ScoreConfig::default()
    };
    let score = calculate_basic_score(&depth, &conv, &score_cfg);
    let frame = DepthFrame::new(&depth, &area, &score).context("assembling frame")?;

    let mut state = SegmentationState::for_frame(&frame);
    let mut tracker = SegmentationTracker::default();

    // Mark every blob pixel as a candidate seed.
    for (p, &d) in state.foreground.data_mut().iter_mut().zip(depth.data()) {
        if d == args.blob_depth {
            *p = PixelType::Foreground;
        }
    }

    let reference_depth = args.blob_depth - args.bandwidth / 2.0;
    let mut tracks = Vec::new();
    let mut pending = vec![(
        TrackedPointType::Active,
        Pixel::new(
            (0.35 * args.width as f32) as usize,
            (0.6 * args.height as f32) as usize,
        ),
    )];

    while let Some((point_type, seed)) = pending.pop() {
        let ctx = TrackingContext {
            seed,
            reference_depth,
            bandwidth_depth: args.bandwidth,
            point_type,
            iteration_max: args.iteration_max,
        };

        let t0 = Instant::now();
        let outcome = tracker
            .converge(&frame, &mut state, &ctx)
            .with_context(|| format!("tracking from ({}, {})", seed.x, seed.y))?;
        let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

        println!(
            "  {:?} seed ({}, {}) -> {:?} after {} passes ({elapsed_ms:.2} ms)",
            point_type, seed.x, seed.y, outcome.point, outcome.iterations
        );
        tracks.push(TrackDto {
            kind: match point_type {
                TrackedPointType::Active => "active",
                TrackedPointType::Candidate => "candidate",
            },
            seed: coords(Some(seed)),
            point: coords(outcome.point),
            iterations: outcome.iterations,
            stop: format!("{:?}", outcome.stop),
            elapsed_ms,
        });

        if pending.is_empty()
            && let Some(next) = find_foreground_pixel(&mut state.foreground)
        {
            pending.push((TrackedPointType::Candidate, next));
        }
    }

    let report = ReportDto {
        width: args.width,
        height: args.height,
        segmented_pixels: state
            .global_segmentation
            .data()
            .iter()
            .filter(|&&v| v != 0)
            .count(),
        tracks,
    };
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    println!("{json}");
    Ok(())
}
