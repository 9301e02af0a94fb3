use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use depth_seg::{
    DepthBand, DepthFrame, Image, ImageView, PinholeConversion, Pixel, PixelType, ScoreConfig,
    SegmentationConfig, SegmentationState, SegmentationTracker, StopReason, TrackedPointType,
    TrackingContext, calculate_basic_score, calculate_edge_distance, calculate_segment_area,
    depth_from_u16, find_foreground_pixel,
};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ds_gallery")]
#[command(about = "Run depth-segmentation algorithms on depth fixtures")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "area")]
    Area(AreaArgs),
    #[command(name = "score")]
    Score(ScoreArgs),
    #[command(name = "edge_distance")]
    EdgeDistance(EdgeDistanceArgs),
    #[command(name = "track")]
    Track(TrackArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// 16-bit grayscale PNG holding depth in millimetres (0 = no reading)
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
    #[arg(long, default_value_t = 1.0)]
    resize_factor: f32,
}

#[derive(Args, Debug, Clone)]
struct AreaArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
struct ScoreArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 1.0)]
    height_factor: f32,
    #[arg(long, default_value_t = 1.0)]
    depth_factor: f32,
}

#[derive(Args, Debug, Clone)]
struct BandArgs {
    #[arg(long, required = true)]
    reference_depth: f32,
    #[arg(long, default_value_t = 150.0)]
    bandwidth: f32,
}

#[derive(Args, Debug, Clone)]
struct EdgeDistanceArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[command(flatten)]
    band: BandArgs,
}

#[derive(Args, Debug, Clone)]
struct TrackArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[command(flatten)]
    band: BandArgs,
    /// Optional truth envelope holding the expected tracked point
    #[arg(long)]
    truth: Option<PathBuf>,
    #[arg(long, required = true)]
    seed_x: usize,
    #[arg(long, required = true)]
    seed_y: usize,
    #[arg(long, default_value_t = false)]
    active: bool,
    #[arg(long, default_value_t = 10)]
    iteration_max: usize,
    #[arg(long, default_value_t = 250.0)]
    max_ttl: f32,
    #[arg(long, default_value_t = 1.0)]
    height_factor: f32,
    #[arg(long, default_value_t = 1.0)]
    depth_factor: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TruthEnvelope {
    case: String,
    width: usize,
    height: usize,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    truth: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct TrackTruthPayload {
    point: [i64; 2],
}

#[derive(Debug, Clone, Serialize)]
struct FieldStats {
    min: f32,
    max: f32,
    nonzero: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaArea {
    resize_factor: f32,
    conversion: &'static str,
    border_rule: &'static str,
    stats: FieldStats,
}

#[derive(Debug, Clone, Serialize)]
struct MetaScore {
    resize_factor: f32,
    height_factor: f32,
    depth_factor: f32,
    max_depth: f32,
    stats: FieldStats,
}

#[derive(Debug, Clone, Serialize)]
struct MetaEdgeDistance {
    reference_depth: f32,
    bandwidth: f32,
    structuring_element: &'static str,
    mask_pixels: usize,
    stats: FieldStats,
}

#[derive(Debug, Clone, Serialize)]
struct TrackResult {
    seed: [i64; 2],
    point: [i64; 2],
    iterations: usize,
    stop: &'static str,
    segmented_pixels: usize,
    remaining_foreground_seeds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches_truth: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaTrack {
    reference_depth: f32,
    bandwidth: f32,
    point_type: &'static str,
    iteration_max: usize,
    max_ttl: f32,
    resize_factor: f32,
    height_factor: f32,
    depth_factor: f32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.cmd {
        Command::Area(args) => run_area(args),
        Command::Score(args) => run_score(args),
        Command::EdgeDistance(args) => run_edge_distance(args),
        Command::Track(args) => run_track(args),
    }
}

fn init_logging(default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("parsing log level '{default_level}'"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn run_area(args: AreaArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "area")?;
    let depth = load_depth(&args.common.input)?;

    let area = calculate_segment_area(
        &depth,
        &PinholeConversion::default(),
        args.common.resize_factor,
    );
    save_f32_vis(case_dir.join("area.png"), &area)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaArea {
            resize_factor: args.common.resize_factor,
            conversion: "pinhole 320x240",
            border_rule: "last row and column are zero",
            stats: field_stats(&area),
        },
    )?;
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "score")?;
    let depth = load_depth(&args.common.input)?;

    let cfg = ScoreConfig {
        height_factor: args.height_factor,
        depth_factor: args.depth_factor,
        resize_factor: args.common.resize_factor,
        ..ScoreConfig::default()
    };
    let score = calculate_basic_score(&depth, &PinholeConversion::default(), &cfg);
    save_f32_vis(case_dir.join("score.png"), &score)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaScore {
            resize_factor: cfg.resize_factor,
            height_factor: cfg.height_factor,
            depth_factor: cfg.depth_factor,
            max_depth: cfg.max_depth,
            stats: field_stats(&score),
        },
    )?;
    Ok(())
}

fn run_edge_distance(args: EdgeDistanceArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "edge_distance")?;
    let depth = load_depth(&args.common.input)?;

    let band = DepthBand::new(args.band.reference_depth, args.band.bandwidth);
    let mut mask = Image::new_fill(depth.width(), depth.height(), 0u8);
    for (m, &d) in mask.data_mut().iter_mut().zip(depth.data()) {
        if band.contains(d) && d >= band.reference {
            *m = 255;
        }
    }

    let area = calculate_segment_area(
        &depth,
        &PinholeConversion::default(),
        args.common.resize_factor,
    );
    let edge = calculate_edge_distance(&mask, &area).context("computing edge distance")?;
    save_u8_image(case_dir.join("mask.png"), &mask)?;
    save_f32_vis(case_dir.join("edge_distance.png"), &edge)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaEdgeDistance {
            reference_depth: band.reference,
            bandwidth: band.bandwidth,
            structuring_element: "cross 3x3",
            mask_pixels: mask.data().iter().filter(|&&v| v != 0).count(),
            stats: field_stats(&edge),
        },
    )?;
    Ok(())
}

fn run_track(args: TrackArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "track")?;
    let depth = load_depth(&args.common.input)?;
    let truth = match &args.truth {
        Some(path) => Some(load_truth(path, "track", &depth, &case_dir)?),
        None => None,
    };

    let conv = PinholeConversion::default();
    let area = calculate_segment_area(&depth, &conv, args.common.resize_factor);
    let score_cfg = ScoreConfig {
        height_factor: args.height_factor,
        depth_factor: args.depth_factor,
        resize_factor: args.common.resize_factor,
        ..ScoreConfig::default()
    };
    let score = calculate_basic_score(&depth, &conv, &score_cfg);
    let frame = DepthFrame::new(&depth, &area, &score).context("assembling depth frame")?;

    let seed = Pixel::new(args.seed_x, args.seed_y);
    let point_type = if args.active {
        TrackedPointType::Active
    } else {
        TrackedPointType::Candidate
    };
    let ctx = TrackingContext {
        seed,
        reference_depth: args.band.reference_depth,
        bandwidth_depth: args.band.bandwidth,
        point_type,
        iteration_max: args.iteration_max,
    };

    // Every in-band pixel starts as a candidate seed, as a host would mark
    // them before tracking; the ones the search reaches are consumed.
    let mut state = SegmentationState::for_frame(&frame);
    let band = ctx.depth_band();
    for (p, &d) in state.foreground.data_mut().iter_mut().zip(depth.data()) {
        if band.contains(d) && d >= band.reference {
            *p = PixelType::Foreground;
        }
    }

    let mut tracker = SegmentationTracker::new(SegmentationConfig {
        max_ttl: args.max_ttl,
    });
    let outcome = tracker
        .converge(&frame, &mut state, &ctx)
        .with_context(|| format!("tracking from seed ({}, {})", seed.x, seed.y))?;
    info!(
        point = ?outcome.point,
        iterations = outcome.iterations,
        "tracking finished"
    );

    let mut remaining = 0usize;
    while find_foreground_pixel(&mut state.foreground).is_some() {
        remaining += 1;
    }

    let (px, py) = Pixel::coords_or_invalid(outcome.point);
    let matches_truth = match truth {
        Some(envelope) => {
            let payload: TrackTruthPayload = serde_json::from_value(envelope.truth.clone())
                .with_context(|| {
                    format!("parsing track truth payload for case '{}'", envelope.case)
                })?;
            Some(payload.point == [px, py])
        }
        None => None,
    };

    save_u8_image(case_dir.join("segmentation.png"), &state.global_segmentation)?;
    write_json(
        case_dir.join("result.json"),
        &TrackResult {
            seed: [seed.x as i64, seed.y as i64],
            point: [px, py],
            iterations: outcome.iterations,
            stop: match outcome.stop {
                StopReason::FixedPoint => "fixed_point",
                StopReason::IterationLimit => "iteration_limit",
                StopReason::Lost => "lost",
            },
            segmented_pixels: state
                .global_segmentation
                .data()
                .iter()
                .filter(|&&v| v != 0)
                .count(),
            remaining_foreground_seeds: remaining,
            matches_truth,
        },
    )?;
    write_json(
        case_dir.join("meta.json"),
        &MetaTrack {
            reference_depth: ctx.reference_depth,
            bandwidth: ctx.bandwidth_depth,
            point_type: if args.active { "active" } else { "candidate" },
            iteration_max: ctx.iteration_max,
            max_ttl: tracker.config().max_ttl,
            resize_factor: args.common.resize_factor,
            height_factor: score_cfg.height_factor,
            depth_factor: score_cfg.depth_factor,
        },
    )?;

    if matches_truth == Some(false) {
        bail!("tracked point ({px}, {py}) does not match truth for case 'track'.");
    }
    Ok(())
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;
    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;
    Ok(case_dir)
}

fn load_truth(
    path: &Path,
    case_name: &str,
    depth: &Image<f32>,
    case_dir: &Path,
) -> Result<TruthEnvelope> {
    ensure_file_exists(path, "truth")?;
    let truth: TruthEnvelope =
        read_json(path).with_context(|| format!("reading truth json at {}", path.display()))?;
    if truth.case != case_name {
        bail!(
            "truth case mismatch: expected '{}', got '{}'.",
            case_name,
            truth.case
        );
    }
    if truth.width != depth.width() || truth.height != depth.height() {
        bail!(
            "truth dimensions ({}, {}) do not match input dimensions ({}, {}).",
            truth.width,
            truth.height,
            depth.width(),
            depth.height()
        );
    }
    write_json(case_dir.join("truth.json"), &truth)?;
    Ok(truth)
}

fn load_depth(path: &Path) -> Result<Image<f32>> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening depth image {}", path.display()))?;
    let (w, h, raw) = match dyn_img {
        // 8-bit fixtures carry depth values directly, no rescaling.
        DynamicImage::ImageLuma8(gray) => {
            let (w, h) = gray.dimensions();
            (w, h, gray.into_raw().into_iter().map(u16::from).collect::<Vec<u16>>())
        }
        other => {
            let luma = other.to_luma16();
            let (w, h) = luma.dimensions();
            (w, h, luma.into_raw())
        }
    };
    let view = ImageView::from_slice(w as usize, h as usize, &raw)
        .with_context(|| format!("constructing depth view from {}", path.display()))?;
    Ok(depth_from_u16(&view))
}

fn field_stats(img: &Image<f32>) -> FieldStats {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut nonzero = 0usize;
    for &v in img.data() {
        min = min.min(v);
        max = max.max(v);
        if v != 0.0 {
            nonzero += 1;
        }
    }
    if img.is_empty() {
        (min, max) = (0.0, 0.0);
    }
    FieldStats { min, max, nonzero }
}

fn save_u8_image(path: PathBuf, img: &Image<u8>) -> Result<()> {
    save_luma_raw(path, img.width(), img.height(), img.data().to_vec())
}

fn save_f32_vis(path: PathBuf, img: &Image<f32>) -> Result<()> {
    save_luma_raw(path, img.width(), img.height(), f32_to_u8_vis(img.data()))
}

fn save_luma_raw(path: PathBuf, width: usize, height: usize, data: Vec<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn f32_to_u8_vis(data: &[f32]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }

    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in data {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    if (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8)
        .collect()
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn only_track_accepts_a_truth_file() {
        for case in ["area", "score"] {
            let parsed = Cli::try_parse_from([
                "ds_gallery",
                case,
                "--input",
                "depth.png",
                "--truth",
                "truth.json",
            ]);
            assert!(parsed.is_err(), "{case} must reject --truth");
        }
        let edge = Cli::try_parse_from([
            "ds_gallery",
            "edge_distance",
            "--input",
            "depth.png",
            "--reference-depth",
            "700",
            "--truth",
            "truth.json",
        ]);
        assert!(edge.is_err());

        let cli = Cli::try_parse_from([
            "ds_gallery",
            "track",
            "--input",
            "depth.png",
            "--reference-depth",
            "700",
            "--seed-x",
            "3",
            "--seed-y",
            "4",
            "--truth",
            "truth.json",
        ])
        .expect("track takes a truth file");
        match cli.cmd {
            Command::Track(args) => {
                assert_eq!(args.truth.as_deref(), Some(std::path::Path::new("truth.json")));
                assert_eq!((args.seed_x, args.seed_y), (3, 4));
            }
            other => panic!("unexpected subcommand {other:?}"),
        }
    }
}
