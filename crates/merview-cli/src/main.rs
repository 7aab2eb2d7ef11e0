use futures::executor::block_on;
use merview::{
    ArtifactExporter, ConfigError, DiagramRenderPipeline, DirectorySink, ExportOutcome,
    RenderError, RenderResult, ViewerConfig,
};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Config(ConfigError),
    Render(RenderError),
    EmptySource,
    Export(ExportOutcome),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::EmptySource => write!(f, "No Mermaid diagram source"),
            CliError::Export(outcome) => write!(f, "export failed: {outcome:?}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RenderError> for CliError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::EmptySource => 3,
            CliError::Render(err) if err.is_invalid_syntax() => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Check,
    Render,
    Export,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<PathBuf>,
    theme: Option<String>,
    dark: bool,
    id_prefix: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "merview-cli\n\
\n\
USAGE:\n\
  merview-cli [check] [--config <file>] [--theme <name>] [--dark] [<path>|-]\n\
  merview-cli render [--config <file>] [--theme <name>] [--dark] [--id <prefix>] [--out <path>] [<path>|-]\n\
  merview-cli export [--config <file>] [--theme <name>] [--dark] [--id <prefix>] [--out <dir>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - --config reads a viewer config; .yaml/.yml files are YAML, anything else JSON.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - export writes mermaid-diagram-<timestamp>.png into --out (default: current directory).\n\
  - Without a diagram engine, render prints the source text unchanged.\n\
  - Exit codes: 2 usage, 3 invalid or empty diagram, 1 anything else.\n\
  - Set MERVIEW_LOG (e.g. MERVIEW_LOG=debug) to control logging.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "check" => args.command = Command::Check,
            "render" => args.command = Command::Render,
            "export" => args.command = Command::Export,
            "--dark" => args.dark = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(PathBuf::from(path));
            }
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if theme.trim().is_empty() {
                    return Err(CliError::Usage(usage()));
                }
                args.theme = Some(theme.trim().to_string());
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.id_prefix = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> Result<ViewerConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => ViewerConfig::from_path(path)?,
        None => ViewerConfig::default(),
    };
    if args.dark {
        cfg.pipeline.theme.dark = true;
    }
    if let Some(theme) = &args.theme {
        if cfg.pipeline.theme.dark {
            cfg.pipeline.theme.dark_theme = theme.clone();
        } else {
            cfg.pipeline.theme.light_theme = theme.clone();
        }
    }
    if let Some(prefix) = &args.id_prefix {
        cfg.pipeline.render_id_prefix = prefix.clone();
    }
    Ok(cfg)
}

fn render(cfg: &ViewerConfig, text: &str) -> Result<String, CliError> {
    let pipeline = DiagramRenderPipeline::new(merview::shared_engine(), cfg.pipeline.clone());
    match block_on(pipeline.render_once(text)) {
        RenderResult::Empty => Err(CliError::EmptySource),
        RenderResult::Failure(err) => Err(err.into()),
        RenderResult::Success(artifact) => Ok(artifact),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let cfg = load_config(&args)?;
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Check => {
            if !has_engine() {
                tracing::warn!("no diagram engine available; syntax was not validated");
            }
            render(&cfg, &text)?;
            println!("ok");
            Ok(())
        }
        Command::Render => {
            let svg = render(&cfg, &text)?;
            write_text(&svg, args.out.as_deref())
        }
        Command::Export => {
            let svg = render(&cfg, &text)?;
            let dir = args.out.as_deref().map_or_else(|| PathBuf::from("."), PathBuf::from);
            let exporter = ArtifactExporter::with_options(DirectorySink::new(&dir), cfg.export.clone());
            match exporter.export(&svg) {
                ExportOutcome::Delivered { file_name, .. } => {
                    println!("{}", dir.join(file_name).display());
                    Ok(())
                }
                other => Err(CliError::Export(other)),
            }
        }
    }
}

fn has_engine() -> bool {
    cfg!(feature = "merman")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MERVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(err.exit_code());
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
