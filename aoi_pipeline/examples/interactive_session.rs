/// Interactive AOI Session Example
///
/// Wires the full pipeline with stub detectors:
/// 1. Worker pool running a hand and a marker detector on every frame
/// 2. One publisher per detector logging result packets as JSON
/// 3. Interactive state machine reading commands from stdin or a script
///
/// Usage:
///   cargo run --example interactive_session -- --frames 300
///   cargo run --example interactive_session -- --image desk.jpg --script session.txt
use anyhow::{Context, Result};
use aoi_pipeline::{
    DetectorBinding, FrameChannel, HandDetection, HeadlessRenderer, InteractiveStateMachine,
    LogSink, Marker, MarkerSnapshot, ResultPublisher, ScriptedCommandSource, SessionConfig,
    SideChannel, StdinCommandSource, StillImageSource, StubHandDetector, StubMarkerDetector,
    SyntheticSource, WorkerContext, WorkerPool,
};
use aoigeom::Bbox;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Define areas of interest over a live detection pipeline")]
struct Args {
    /// JSON session config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Still image replayed as the video stream
    #[arg(long)]
    image: Option<PathBuf>,

    /// Stop after this many frames (synthetic source only)
    #[arg(long)]
    frames: Option<u64>,

    /// File with one command per line, used instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Save every Nth shown frame here
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(long, default_value_t = 30)]
    snapshot_every: u64,

    /// Write committed AOIs here as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Simulated per-frame detector latency in milliseconds
    #[arg(long, default_value_t = 5)]
    latency_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("🎯 Interactive AOI Session\n");

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    config.validate()?;
    let params = config.capability_params();
    let latency = Duration::from_millis(args.latency_ms);

    let hands = StubHandDetector::new(vec![
        HandDetection::from_normalized([0.10, 0.55, 0.22, 0.80], 0.91, &params),
        HandDetection::from_normalized([0.70, 0.50, 0.82, 0.78], 0.64, &params),
        HandDetection::new(Bbox::new(400.0, 40.0, 440.0, 80.0), 0.12),
    ])
    .with_latency(latency);
    let markers = StubMarkerDetector::new(vec![
        Marker::square(3, 120, 120, 60),
        Marker::square(7, 360, 200, 60),
        Marker::square(11, 620, 140, 60),
    ])
    .with_latency(latency);

    // unbounded so a slow publisher never stalls detection
    let hand_results = SideChannel::unbounded();
    let marker_results = SideChannel::unbounded();
    let snapshot = MarkerSnapshot::default();

    let ctx = WorkerContext {
        input: FrameChannel::new(config.queue_size),
        output: FrameChannel::new(config.queue_size),
        detectors: vec![
            DetectorBinding::new(Arc::new(hands), hand_results.clone())?,
            DetectorBinding::new(Arc::new(markers), marker_results.clone())?,
        ],
        params: Arc::new(params),
        markers: Some(snapshot.clone()),
        failure_policy: config.failure_policy,
    };
    let (input, output) = (ctx.input.clone(), ctx.output.clone());

    print!("📦 Starting {} detection workers... ", config.num_workers);
    let pool = WorkerPool::new(config.num_workers, ctx)?;
    println!("✓");

    let hand_publisher = ResultPublisher::spawn("hands", hand_results, LogSink)?;
    let marker_publisher = ResultPublisher::spawn("markers", marker_results, LogSink)?;

    let mut renderer = HeadlessRenderer::new();
    if let Some(path) = &args.snapshot {
        renderer = renderer.with_snapshot(path, args.snapshot_every);
    }

    let builder = InteractiveStateMachine::builder(config.clone())
        .renderer(renderer)
        .channels(input, output)
        .markers(snapshot)
        .on_cleanup(move || {
            let mut pool = pool;
            let mut publishers = [hand_publisher, marker_publisher];
            match pool.shutdown() {
                Ok(frames) => log::info!("✓ Worker pool processed {} frames", frames),
                Err(e) => log::error!("❌ Worker pool failed: {}", e),
            }
            for publisher in publishers.iter_mut() {
                if let Err(e) = publisher.cancel() {
                    log::error!("❌ Publisher shutdown failed: {}", e);
                }
            }
        });

    let builder = match &args.image {
        Some(path) => builder.frame_source(
            StillImageSource::open(path, config.width, config.height)
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => {
            let source = SyntheticSource::new(config.width, config.height);
            builder.frame_source(match args.frames {
                Some(n) => source.with_limit(n),
                None => source,
            })
        }
    };

    let builder = match &args.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            builder.command_source(ScriptedCommandSource::new(
                text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from),
            ))
        }
        None => builder.command_source(StdinCommandSource::spawn()?),
    };

    let machine = builder.build()?;
    println!("💡 Type a command and press enter; 'q' quits\n");
    println!("{}", machine.tree().help());

    let summary = machine.run()?;

    println!("\n📊 Session summary");
    println!("   Stop reason: {:?}", summary.reason);
    println!("   Frames:      {}", summary.frames_processed);
    println!("   Elapsed:     {:.2}s", summary.elapsed.as_secs_f64());
    println!("   Throughput:  {:.1} FPS", summary.fps);
    println!("   AOIs:        {}", summary.aois.len());
    for aoi in &summary.aois {
        println!(
            "     {} markers={:?} points={}",
            aoi.name,
            aoi.selected_marker_ids,
            aoi.boundary.len()
        );
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&summary.aois)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("✓ AOIs saved to {}", path.display());
    }

    Ok(())
}
