use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pyxgen_annotate::{HeaderPlacement, HeuristicAnnotator};
use pyxgen_driver::build::{DEFAULT_CACHE_DIR, DEFAULT_LIB_ROOT, DEFAULT_OUTPUT_DIR};
use pyxgen_driver::package::DIST_DIR;
use pyxgen_driver::{build, package_and_install, BuildConfig, CythonBackend, Stager};
use pyxgen_scan::probe::interpreter_from_env;
use pyxgen_scan::{ImportScanner, PythonProbe};

#[derive(Parser)]
#[command(
    name = "pyxgen",
    version,
    about = "Compile a Python project folder or an installed library into Cython extensions"
)]
struct Cli {
    /// Target folder or Python library to compile
    #[arg(short, long)]
    target: String,

    /// Staging directory for annotated .pyx files (wiped on every run)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Build a wheel and install it after a successful build
    #[arg(short, long)]
    install: bool,

    /// Root of the compiled library layout
    #[arg(long, default_value = DEFAULT_LIB_ROOT)]
    lib_dir: PathBuf,

    /// Cython incremental cache directory
    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    /// Python interpreter (defaults to $PYXGEN_PYTHON, then python3)
    #[arg(long)]
    python: Option<String>,

    /// Keep a `#!` interpreter line first when adding the cimport header
    #[arg(long)]
    keep_shebang: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pyxgen=debug,pyxgen_driver=debug,pyxgen_scan=debug"
    } else {
        "pyxgen=info,pyxgen_driver=info,pyxgen_scan=info"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let python = cli.python.unwrap_or_else(interpreter_from_env);

    let placement = if cli.keep_shebang {
        HeaderPlacement::AfterShebang
    } else {
        HeaderPlacement::Top
    };
    let annotator = HeuristicAnnotator::new().with_header_placement(placement);
    let scanner = ImportScanner::new(PythonProbe::new(python.clone()));
    let stager = Stager::new(annotator, scanner).with_diagnostics(true);
    let backend = CythonBackend::new(python);

    let config = BuildConfig::new(cli.target, cli.output)
        .with_lib_root(cli.lib_dir)
        .with_cache_dir(cli.cache_dir);

    let result = build(&config, &stager, &backend)?;
    info!("Library ready at {}", result.lib_dir.display());

    if cli.install {
        if let Some(wheel) = package_and_install(&backend, Path::new(DIST_DIR))? {
            info!("Installed {}", wheel.display());
        }
    }

    Ok(())
}
