use clap::Parser;
use homecalc::api::{Cli, Command, render_command, run_http_server};
use homecalc::telemetry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    if let Command::Serve(args) = &cli.command {
        if let Err(e) = run_http_server(args.port).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match render_command(&cli.command) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
