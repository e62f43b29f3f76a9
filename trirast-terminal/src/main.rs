/// Trirast Terminal - fly through a mesh in the terminal
///
/// Controls:
///   - Mouse: look around
///   - W/A/S/D: move, E/Q: up/down
///   - Shift / Ctrl: fast / slow
///   - C/Z: zoom in/out, R: back to the origin
///   - V (held): wireframe
///   - Esc: quit
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use trirast_core::headless::{CapturePresenter, HeadlessWindow};
use trirast_core::math::Vec3;
use trirast_core::mesh::{self, ParsedMesh};
use trirast_core::{FrameLoop, RenderConfig, VertexStream};
use trirast_terminal::{ScanlineKernel, TerminalApp};

#[derive(Parser, Debug)]
#[command(name = "trirast-terminal", version, about = "Software triangle rasterizer in the terminal")]
struct Cli {
    /// Mesh file (.obj or .stl); a unit cube is shown when omitted
    mesh: Option<PathBuf>,

    /// Offset added to every vertex position, as x,y,z
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,0", allow_hyphen_values = true)]
    offset: Vec3,

    /// Uniform scale applied to every vertex position before the offset
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov: Option<f32>,

    /// Camera start position, as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    start: Option<Vec3>,

    /// Vertex stream capacity in floats
    #[arg(long, default_value_t = RenderConfig::DEFAULT_VERTEX_CAPACITY)]
    vertex_capacity: usize,

    /// Frame rate the terminal loop paces itself to
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Render without a terminal and log the final statistics
    #[arg(long)]
    headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Headless surface width
    #[arg(long, default_value_t = 800)]
    width: i32,

    /// Headless surface height
    #[arg(long, default_value_t = 600)]
    height: i32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {} values", parts.len())),
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn config(cli: &Cli) -> RenderConfig {
    let mut config = RenderConfig {
        vertex_capacity: cli.vertex_capacity,
        ..RenderConfig::default()
    };
    if let Some(fov) = cli.fov {
        config.camera.fov_degrees = fov.clamp(config.camera.min_fov_degrees, config.camera.max_fov_degrees);
    }
    if let Some(start) = cli.start {
        config.camera.start_position = start;
    }
    config.frame.initial_width = cli.width;
    config.frame.initial_height = cli.height;
    config
}

fn load_vertices(cli: &Cli, capacity: usize) -> Result<VertexStream> {
    let mut stream = VertexStream::with_capacity(capacity);
    let floats = match &cli.mesh {
        Some(path) => mesh::load_into(path, &mut stream, cli.offset, cli.scale)
            .with_context(|| format!("failed to load mesh {}", path.display()))?,
        None => mesh::flatten(&ParsedMesh::cube(1.0), &mut stream, cli.offset, cli.scale)
            .context("failed to build the default cube")?,
    };
    tracing::info!(floats, vertices = stream.vertex_count(), "vertex stream ready");
    Ok(stream)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = config(&cli);
    let vertices = load_vertices(&cli, config.vertex_capacity)?;

    let last = if cli.headless {
        let mut frames = FrameLoop::new(&config, vertices).context("failed to start frame loop")?;
        let mut window = HeadlessWindow::new(cli.width, cli.height).with_frame_limit(cli.frames);
        let mut presenter = CapturePresenter::new();
        frames.run(&mut window, &mut ScanlineKernel::default(), &mut presenter)?
    } else {
        let mut app = TerminalApp::new(config, vertices, cli.fps).context("failed to start terminal")?;
        app.run()?
    };

    if let Some(stats) = last {
        tracing::info!(frames = stats.frame_index, "{stats}");
    }
    Ok(())
}
