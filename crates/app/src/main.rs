use std::{path::PathBuf, rc::Rc, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use zellij_core::{
    AppConfig, Clock, ConstructionCircle, PatternController, PatternOneConstruction,
    PatternOneDrawing, PlaybackClock, Recorder, Rect, RenderCommand, RenderSink, Shape,
    SharedClock, WallClock, ZellijError,
};

fn main() -> zellij_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play { options } => run_play(&options),
        Commands::Record { options, output } => run_record(&options, output),
    }
}

fn run_play(options: &PatternOptions) -> zellij_core::Result<()> {
    let config = options.resolve()?;
    let pulse = config.pulse()?;
    let rect = config.canvas.rect()?;
    let delay = options.delay()?;
    let clock: SharedClock = Rc::new(WallClock::start());
    tracing::info!(pattern = ?options.pattern, ?pulse, ?rect, "starting playback");

    match options.pattern {
        PatternKind::ConstructionCircle => play(
            ConstructionCircle::new(clock.clone(), pulse)?,
            &clock,
            rect,
            delay,
        ),
        PatternKind::PatternOneConstruction => play(
            PatternOneConstruction::new(clock.clone(), pulse)?,
            &clock,
            rect,
            delay,
        ),
        PatternKind::PatternOneDrawing => play(
            PatternOneDrawing::with_finale(clock.clone(), pulse, config.finale)?,
            &clock,
            rect,
            delay,
        ),
    }
}

fn play<C: PatternController>(
    mut controller: C,
    clock: &SharedClock,
    rect: Rect,
    delay: Duration,
) -> zellij_core::Result<()> {
    controller.start(rect, delay)?;
    let end = delay + controller.span();
    let idle = controller.pulse() / 4;
    let mut sink = TracingSink::default();

    loop {
        let now = clock.now();
        controller.poll(&mut sink);
        if now >= end {
            break;
        }
        std::thread::sleep(idle);
    }

    controller.stop();
    tracing::info!(
        commands = sink.delivered,
        shapes = controller.shapes().len(),
        "playback finished"
    );
    Ok(())
}

fn run_record(options: &PatternOptions, output: Option<PathBuf>) -> zellij_core::Result<()> {
    let config = options.resolve()?;
    let pulse = config.pulse()?;
    let rect = config.canvas.rect()?;
    let delay = options.delay()?;
    tracing::info!(pattern = ?options.pattern, ?output, "recording transcript");

    let clock = PlaybackClock::new();
    let shared = clock.shared();
    let mut recorder = Recorder::new(config.recording.clone(), shared.clone());

    match options.pattern {
        PatternKind::ConstructionCircle => record(
            ConstructionCircle::new(shared, pulse)?,
            &clock,
            &mut recorder,
            rect,
            delay,
        )?,
        PatternKind::PatternOneConstruction => record(
            PatternOneConstruction::new(shared, pulse)?,
            &clock,
            &mut recorder,
            rect,
            delay,
        )?,
        PatternKind::PatternOneDrawing => record(
            PatternOneDrawing::with_finale(shared, pulse, config.finale)?,
            &clock,
            &mut recorder,
            rect,
            delay,
        )?,
    }

    match output {
        Some(path) => recorder.write_to(path),
        None => recorder.save(),
    }
}

fn record<C: PatternController>(
    mut controller: C,
    clock: &PlaybackClock,
    recorder: &mut Recorder,
    rect: Rect,
    delay: Duration,
) -> zellij_core::Result<()> {
    let steps = recorder.settings().steps_per_pulse.max(1);
    let step = (controller.pulse() / steps).max(Duration::from_nanos(1));

    controller.start(rect, delay)?;
    let end = delay + controller.span();
    recorder.start();

    while clock.now() < end {
        clock.advance(step);
        controller.poll(recorder);
    }

    controller.stop();
    recorder.stop();
    tracing::info!(commands = recorder.commands().len(), "simulation finished");
    Ok(())
}

/// Logs every render command instead of painting it.
#[derive(Debug, Default)]
struct TracingSink {
    delivered: usize,
}

impl RenderSink for TracingSink {
    fn submit(&mut self, command: RenderCommand) {
        self.delivered += 1;
        let kind = match &command.target {
            Shape::Circle(_) => "circle",
            Shape::Line(_) => "line",
            Shape::Marker(_) => "marker",
        };
        tracing::info!(
            shape = %command.shape_id,
            kind,
            duration = ?command.transition.duration,
            repeat = ?command.transition.repeat,
            target = ?command.target,
            "render"
        );
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated zellij pattern construction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a pattern in real time, logging each render command.
    Play {
        #[command(flatten)]
        options: PatternOptions,
    },
    /// Simulate a pattern offline and write its render transcript as JSON.
    Record {
        #[command(flatten)]
        options: PatternOptions,
        /// Transcript path; defaults to the configured output path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PatternKind {
    ConstructionCircle,
    PatternOneConstruction,
    PatternOneDrawing,
}

#[derive(Args, Debug)]
struct PatternOptions {
    /// Pattern to animate.
    #[arg(short, long, value_enum, default_value_t = PatternKind::PatternOneDrawing)]
    pattern: PatternKind,
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seconds between timeline steps.
    #[arg(long)]
    pulse: Option<f64>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    /// Seconds to wait before the first step.
    #[arg(long, default_value_t = 0.0)]
    delay: f64,
}

impl PatternOptions {
    fn resolve(&self) -> zellij_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(pulse) = self.pulse {
            config.pulse_seconds = pulse;
        }
        if let Some(width) = self.width {
            config.canvas.width = width;
        }
        if let Some(height) = self.height {
            config.canvas.height = height;
        }

        config.validate()?;
        Ok(config)
    }

    fn delay(&self) -> zellij_core::Result<Duration> {
        Duration::try_from_secs_f64(self.delay).map_err(|_| {
            ZellijError::InvalidConfig(format!("delay must be non-negative, got {}", self.delay))
        })
    }
}
