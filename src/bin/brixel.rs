use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use brixel::{
    BlendEngine, BufferId, BufferPool, DrawCommand, FillMode, PixelBuffer, ProgramStep, RenderOp,
    Rgba8Premul, convert,
};

#[derive(Parser, Debug)]
#[command(name = "brixel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Blend one image onto a canvas or another image, write a PNG.
    Blend(BlendArgs),
    /// Run a JSON filter program over a set of buffers.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct BlendArgs {
    /// Source image (PNG).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Load the source as a grayscale coverage mask instead of RGBA.
    #[arg(long)]
    mask: bool,

    /// Destination image; a transparent canvas of --size when absent.
    #[arg(long)]
    onto: Option<PathBuf>,

    /// Canvas size as WxH (used when --onto is absent).
    #[arg(long, default_value = "512x512")]
    size: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = FillChoice::None)]
    fill: FillChoice,

    #[arg(long, value_enum, default_value_t = OpChoice::Blend)]
    op: OpChoice,

    /// Tint as straight "r,g,b,a" (premultiplied internally).
    #[arg(long)]
    tint: Option<String>,

    #[arg(long, default_value_t = 0)]
    offset_x: i32,

    #[arg(long, default_value_t = 0)]
    offset_y: i32,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Program JSON (buffers, steps, saves).
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FillChoice {
    None,
    Stretch,
    StretchX,
    StretchY,
    Repeat,
    RepeatX,
    RepeatY,
}

impl FillChoice {
    fn to_fill_mode(self) -> FillMode {
        use brixel::AxisFill;
        let (x, y) = match self {
            FillChoice::None => (AxisFill::None, AxisFill::None),
            FillChoice::Stretch => (AxisFill::Stretch, AxisFill::Stretch),
            FillChoice::StretchX => (AxisFill::Stretch, AxisFill::None),
            FillChoice::StretchY => (AxisFill::None, AxisFill::Stretch),
            FillChoice::Repeat => (AxisFill::Repeat, AxisFill::Repeat),
            FillChoice::RepeatX => (AxisFill::Repeat, AxisFill::None),
            FillChoice::RepeatY => (AxisFill::None, AxisFill::Repeat),
        };
        FillMode { x, y }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpChoice {
    Blend,
    Copy,
    Add,
    Sub,
    Mul,
    Mask,
}

impl OpChoice {
    fn to_render_op(self) -> RenderOp {
        match self {
            OpChoice::Blend => RenderOp::Blend,
            OpChoice::Copy => RenderOp::Copy,
            OpChoice::Add => RenderOp::Add,
            OpChoice::Sub => RenderOp::Sub,
            OpChoice::Mul => RenderOp::Mul,
            OpChoice::Mask => RenderOp::Mask,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Blend(args) => cmd_blend(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn cmd_blend(args: BlendArgs) -> anyhow::Result<()> {
    let input = load_buffer(&args.in_path, BufferId(1), args.mask)?;

    let mut output = match &args.onto {
        Some(path) => load_buffer(path, BufferId(2), false)?,
        None => {
            let (w, h) = parse_size(&args.size)?;
            PixelBuffer::new_rgba(BufferId(2), w, h)?
        }
    };

    let mut cmd = DrawCommand::default()
        .with_fill(args.fill.to_fill_mode())
        .with_op(args.op.to_render_op())
        .with_offset(args.offset_x, args.offset_y);
    if let Some(tint) = &args.tint {
        cmd = cmd.with_tint(parse_tint(tint)?);
    }

    let engine = BlendEngine::default();
    engine
        .blend(&cmd, &input, &mut output)
        .with_context(|| "blend failed")?;

    save_buffer(&output, &args.out)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let f = File::open(&args.in_path)
        .with_context(|| format!("open program '{}'", args.in_path.display()))?;
    let file: ProgramFile =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse program JSON")?;

    let mut pool = BufferPool::new();
    for decl in &file.buffers {
        pool.insert(decl.load()?);
    }

    let engine = BlendEngine::default();
    let program = brixel::FilterProgram::new(file.steps.clone());
    program
        .run(&engine, &mut pool)
        .with_context(|| "program aborted")?;

    for save in &file.save {
        let buf = pool
            .get(BufferId(save.id))
            .with_context(|| format!("no buffer {} to save", save.id))?;
        save_buffer(buf, &save.path)?;
    }
    Ok(())
}

#[derive(Debug, serde::Deserialize)]
struct ProgramFile {
    buffers: Vec<BufferDecl>,
    steps: Vec<ProgramStep>,
    #[serde(default)]
    save: Vec<SaveDecl>,
}

#[derive(Debug, serde::Deserialize)]
struct BufferDecl {
    id: u64,
    /// Image to load; a blank buffer of `width` x `height` when absent.
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    mask: bool,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl BufferDecl {
    fn load(&self) -> anyhow::Result<PixelBuffer> {
        match &self.path {
            Some(path) => load_buffer(path, BufferId(self.id), self.mask),
            None if self.mask => Ok(PixelBuffer::new_alpha(
                BufferId(self.id),
                self.width,
                self.height,
            )?),
            None => Ok(PixelBuffer::new_rgba(
                BufferId(self.id),
                self.width,
                self.height,
            )?),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct SaveDecl {
    id: u64,
    path: PathBuf,
}

fn load_buffer(path: &Path, id: BufferId, mask: bool) -> anyhow::Result<PixelBuffer> {
    let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
    let buf = if mask {
        convert::buffer_from_gray_image(id, &img.to_luma8())?
    } else {
        convert::buffer_from_rgba_image(id, &img.to_rgba8())?
    };
    Ok(buf)
}

fn save_buffer(buf: &PixelBuffer, path: &Path) -> anyhow::Result<()> {
    match buf.format {
        brixel::PixelFormat::Rgba => convert::buffer_to_rgba_image(buf)?
            .save(path)
            .with_context(|| format!("save '{}'", path.display()))?,
        brixel::PixelFormat::Alpha => convert::buffer_to_gray_image(buf)?
            .save(path)
            .with_context(|| format!("save '{}'", path.display()))?,
    }
    Ok(())
}

fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("size '{s}' is not WxH"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn parse_tint(s: &str) -> anyhow::Result<Rgba8Premul> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        anyhow::bail!("tint '{s}' is not r,g,b,a");
    }
    let c: Vec<u8> = parts
        .iter()
        .map(|p| p.parse::<u8>())
        .collect::<Result<_, _>>()?;
    Ok(Rgba8Premul::from_straight_rgba(c[0], c[1], c[2], c[3]))
}
