use clap::Parser;
use miette::Result;
use ptrack::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose)?;

    match cli.command {
        Commands::Init(args) => ptrack::cli::commands::init::run(args, &global),
        Commands::Project(cmd) => ptrack::cli::commands::project::run(cmd, &global),
        Commands::Employee(cmd) => ptrack::cli::commands::employee::run(cmd, &global),
        Commands::Task(cmd) => ptrack::cli::commands::task::run(cmd, &global),
        Commands::Bug(cmd) => ptrack::cli::commands::bug::run(cmd, &global),
        Commands::Event(cmd) => ptrack::cli::commands::event::run(cmd, &global),
        Commands::Doc(cmd) => ptrack::cli::commands::doc::run(cmd, &global),
        Commands::Report(cmd) => ptrack::cli::commands::report::run(cmd, &global),
        Commands::Completions(args) => ptrack::cli::commands::completions::run(args),
    }
}

/// Log to stderr. `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "ptrack=debug",
        _ => "ptrack=trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| miette::miette!("failed to initialize logging: {}", e))
}
