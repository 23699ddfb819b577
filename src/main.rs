use clap::Parser;
use inventario::cli::{Cli, Commands, GlobalOpts};
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) so piping into
    // `head` or `grep -q` does not panic on a broken pipe.
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
    init_logging(&global);

    match cli.command {
        Commands::Init(args) => inventario::cli::commands::init::run(args, &global),
        Commands::Item(cmd) => inventario::cli::commands::item::run(cmd, &global),
        Commands::Product(cmd) => inventario::cli::commands::product::run(cmd, &global),
        Commands::Columns(cmd) => inventario::cli::commands::columns::run(cmd, &global),
        Commands::Schema(args) => inventario::cli::commands::schema::run(args, &global),
        Commands::Status(args) => inventario::cli::commands::status::run(args, &global),
        Commands::Completions(args) => inventario::cli::commands::completions::run(args),
    }
}

/// Log to stderr; RUST_LOG overrides the level picked by -v / -q
fn init_logging(global: &GlobalOpts) {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
