use clap::Parser;
use research_page::{Research, Transport, server};
use std::process::ExitCode;
use std::sync::Arc;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let research = match &args.config {
        Some(path) => match Research::new().with_config_file(path) {
            Ok(research) => research,
            Err(e) => {
                ::log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Research::new(),
    };
    let research = args.apply_to(research.with_env());

    let config = research.config();
    if config.fetch.transport == Transport::WebDriver {
        println!("Note: the webdriver transport requires a WebDriver server (e.g., ChromeDriver).");
        println!(
            "Set WEBDRIVER_URL environment variable if not using {}",
            config.fetch.webdriver_url
        );
    }

    let bind = config.server.bind.clone();
    let synthesizer = match research.build() {
        Ok(synthesizer) => Arc::new(synthesizer),
        Err(e) => {
            ::log::error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = match args.command {
        Command::Ask { question } => match synthesizer.synthesize(&question).await {
            Ok(analysis) => {
                println!("{}", analysis.summary);
                if !analysis.central_pages.is_empty() {
                    println!("\nCentral pages:");
                    for page in &analysis.central_pages {
                        println!("- {} <{}>", page.title, page.url);
                    }
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                ::log::error!("Analysis failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Serve { .. } => match server::serve(Arc::clone(&synthesizer), &bind).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                ::log::error!("Server error on {}: {}", bind, e);
                ExitCode::FAILURE
            }
        },
    };

    synthesizer.shutdown().await;
    code
}
