use std::{net::SocketAddr, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use docsift::{
    dataset::SourceMapping,
    links::LinkSpec,
    sections::DEFAULT_SPLIT_DEPTH,
};

#[derive(Debug, Parser)]
#[command(
    name = "docsift",
    about = "Split markdown documentation into sections and search them"
)]
pub struct Cli {
    /// Section tree root (default: XDG data directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the section tree from a markdown source tree
    Make(MakeArgs),
    /// Remove the section tree
    Clear,
    /// Search the section tree
    Search(SearchArgs),
    /// Serve the search HTTP API
    Serve(ServeArgs),
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Make --

#[derive(Debug, Parser)]
pub struct MakeArgs {
    /// Markdown source tree
    #[arg(long, env = "DOCSIFT_SOURCE_DIR")]
    pub source: PathBuf,

    /// Map a source subdirectory to an output subdirectory (SRC=DEST)
    #[arg(long = "map", value_name = "SRC=DEST")]
    pub mappings: Vec<SourceMapping>,

    /// Deepest heading level that starts a new section
    #[arg(long, default_value_t = DEFAULT_SPLIT_DEPTH)]
    pub split_depth: usize,

    /// Suffix repeated section ids instead of overwriting
    #[arg(long)]
    pub disambiguate: bool,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "10", allow_negative_numbers = true)]
    pub count: i64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Serve --

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000", env = "DOCSIFT_ADDR")]
    pub addr: SocketAddr,

    /// Site whose links point at the section (LABEL=URL, repeatable or
    /// comma-separated)
    #[arg(
        long = "link",
        value_name = "LABEL=URL",
        env = "DOCSIFT_LINKS",
        value_delimiter = ','
    )]
    pub links: Vec<LinkSpec>,

    /// Site whose links point at the page only (LABEL=URL, repeatable or
    /// comma-separated)
    #[arg(
        long = "page-link",
        value_name = "LABEL=URL",
        env = "DOCSIFT_PAGE_LINKS",
        value_delimiter = ','
    )]
    pub page_links: Vec<LinkSpec>,

    /// Public URL of this server, for logs
    #[arg(long, env = "DOCSIFT_SERVER_URL")]
    pub server_url: Option<String>,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docsift",
            &mut std::io::stdout(),
        );
    }
}
