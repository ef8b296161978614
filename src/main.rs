use clap::{Parser, Subcommand};
use sitekiln::{build, config, output, serve};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitekiln")]
#[command(about = "Static site builder")]
#[command(long_about = "\
Static site builder

Reads documents from content/, renders them with the layouts in layouts/ and
the datasets in data/, and writes a fresh site to build/.

Project structure:

  my-site/
  ├── site.toml                 # Optional overrides (see gen-config)
  ├── content/
  │   ├── index.md              # → build/index.html
  │   ├── about.md              # → build/about/index.html (page layout)
  │   ├── team.jinja2           # → build/team/index.html (its own template)
  │   └── robots.txt            # → build/robots.txt (copied as is)
  ├── layouts/
  │   └── page.jinja2           # Wraps Markdown pages; gets `context` and `doc`
  ├── data/
  │   └── team.csv              # → context.data.team
  └── static/
      └── css/site.css          # → build/static/css/site.css

Documents may start with a YAML header between --- lines; its keys are
available as doc.metadata.<key>.

Run 'sitekiln gen-config' to print a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Project root (the directory holding content/, layouts/, ...)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log pipeline progress (otherwise RUST_LOG decides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build,
    /// Rebuild on every request and serve the output directory
    Serve {
        /// Override serve.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build => {
            let site_config = config::load_config(&cli.root)?;
            println!("==> Building {}", cli.root.display());
            let report = build::build(&site_config, &cli.root)?;
            output::print_build_output(&report, &static_dir_name(&site_config));
        }
        Command::Serve { port } => {
            let mut site_config = config::load_config(&cli.root)?;
            if let Some(port) = port {
                site_config.serve.port = port;
            }
            serve::serve_site(&site_config, &cli.root)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Name the static directory gets inside the output root.
fn static_dir_name(site_config: &config::SiteConfig) -> String {
    std::path::Path::new(&site_config.paths.static_dir)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| site_config.paths.static_dir.clone())
}
