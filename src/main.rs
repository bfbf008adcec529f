use inkwell_routing::cli::run_cli;
use inkwell_routing::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let _guard = init_logging(&LogConfig::from_env())?;
    run_cli()
}
