use clap::Parser;
use docsift::{
    DataDir,
    DocCache,
    dataset::{self, MakeOptions, SourceMapping},
    error,
    links::LinkConfig,
    mcp,
    search,
    web,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCSIFT_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout belongs to command output and the MCP transport.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Completions never touch the data directory.
    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Make(args) => cmd_make(&data_dir, args)?,
        Command::Clear => {
            dataset::clear_data(data_dir.root())?;
            println!("Removed {}", data_dir.root().display());
        }
        Command::Search(args) => {
            let cache = DocCache::load(data_dir.root())?;
            let results = cache.search(&args.query, args.count);

            if args.json {
                let json = search::format_json(&results, &args.query)?;
                println!("{json}");
            } else {
                print!("{}", search::format_human(&results));
            }
        }
        Command::Serve(args) => {
            let cache = DocCache::load(data_dir.root())?;
            let links = LinkConfig::new(&args.links, &args.page_links);
            web::run_server(
                args.addr,
                cache,
                links,
                args.server_url.as_deref(),
            )?;
        }
        Command::Mcp => {
            let cache = DocCache::load(data_dir.root())?;
            mcp::run_mcp(cache)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_make(data_dir: &DataDir, args: cli::MakeArgs) -> error::Result<()> {
    let mappings = if args.mappings.is_empty() {
        vec![SourceMapping::default()]
    } else {
        args.mappings
    };
    let options = MakeOptions {
        mappings,
        split_depth: args.split_depth,
        disambiguate: args.disambiguate,
    };

    let report = dataset::make_data(&args.source, data_dir.root(), &options)?;

    println!(
        "Read {} files, segmented {}, wrote {} sections to {}",
        report.files_read,
        report.files_segmented,
        report.sections_written,
        data_dir.root().display()
    );
    if report.collisions > 0 {
        eprintln!(
            "Warning: {} section id(s) repeated within a page{}",
            report.collisions,
            if options.disambiguate {
                " and were suffixed"
            } else {
                "; earlier sections were overwritten"
            }
        );
    }
    Ok(())
}
