use clap::Parser;
use veil::cli::{
    handle_completions, handle_config_init, handle_mask, handle_redact, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => veil::cli::serve::run_serve(args).await,
        Commands::Redact(args) => handle_redact(&args).map(|output| println!("{}", output)),
        Commands::Mask(args) => {
            println!("{}", handle_mask(&args));
            Ok(())
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
