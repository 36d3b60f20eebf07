use clap::{Parser, Subcommand, ValueEnum};
use research_page::{Research, Transport};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "research-page")]
#[command(about = "Answers questions by searching, fetching and ranking web pages")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of concurrent fetches
    #[arg(short, long, global = true)]
    pub concurrency: Option<usize>,

    /// Per-page fetch timeout in seconds
    #[arg(long, global = true)]
    pub fetch_timeout: Option<u64>,

    /// How pages are fetched
    #[arg(short, long, value_enum, global = true)]
    pub transport: Option<TransportArg>,

    /// Levels of same-site links to follow past the search results
    #[arg(long, global = true)]
    pub expand_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a single question and print the result
    Ask {
        /// The question to research
        question: String,
    },
    /// Serve POST /analyze over HTTP
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Http,
    Webdriver,
}

impl From<TransportArg> for Transport {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Http => Transport::Http,
            TransportArg::Webdriver => Transport::WebDriver,
        }
    }
}

impl Args {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply_to(&self, mut research: Research) -> Research {
        if let Some(concurrency) = self.concurrency {
            research = research.with_max_concurrency(concurrency);
        }
        if let Some(timeout) = self.fetch_timeout {
            research = research.with_fetch_timeout(timeout);
        }
        if let Some(transport) = self.transport {
            research = research.with_transport(transport.into());
        }
        if let Some(depth) = self.expand_depth {
            research = research.with_expand_depth(depth);
        }
        if let Command::Serve { bind: Some(bind) } = &self.command {
            research = research.with_bind(bind.clone());
        }
        research
    }
}
