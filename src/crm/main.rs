use clap::Parser;
use colored::*;
use crm::config::CrmConfig;
use crm::error::{CrmError, Result};
use crm::ids::EntityKind;
use crm::repository::{LoadOutcome, Repository};
use crm::store::fs::FileStore;
use log::debug;
use std::io::{self, Write};
use std::path::PathBuf;

mod args;
mod cli;
use args::{Cli, Commands};
use cli::render;
use cli::shell::Shell;
use cli::ConsoleNotifier;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

struct AppContext {
    repo: Repository<FileStore>,
    config: CrmConfig,
    loaded: LoadOutcome,
}

fn run(cli: Cli) -> Result<()> {
    let ctx = init_context(&cli)?;

    match cli.command {
        None | Some(Commands::Shell) => handle_shell(ctx),
        Some(Commands::List) => handle_list(&ctx),
        Some(Commands::Search { keyword }) => handle_search(&ctx, &keyword),
        Some(Commands::Show { id }) => handle_show(&ctx, id),
        Some(Commands::Report) => handle_report(&ctx),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = CrmConfig::discover(&cwd)?;

    let data_file = cli
        .data_file
        .clone()
        .unwrap_or_else(|| config.data_file.clone());
    let store = FileStore::new(data_file).with_atomic_writes(config.atomic_save);
    let mut repo = Repository::new(store);
    let loaded = repo.load()?;
    debug!(
        "event=ids_ready customer={} communication={} task={}",
        repo.ids().peek(EntityKind::Customer),
        repo.ids().peek(EntityKind::Communication),
        repo.ids().peek(EntityKind::Task)
    );

    Ok(AppContext {
        repo,
        config,
        loaded,
    })
}

fn handle_shell(mut ctx: AppContext) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    render::load_outcome(&mut out, &ctx.loaded, &ctx.repo.location())?;
    out.flush()?;
    // Notifications print straight to stdout, so release the lock first.
    drop(out);

    ctx.repo
        .subscribe(Box::new(ConsoleNotifier::new(ctx.config.notifier_name.clone())));

    let stdin = io::stdin();
    Shell::new(&mut ctx.repo, stdin.lock(), io::stdout())
        .run()
        .map_err(CrmError::Io)
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let customers = ctx.repo.customers();
    let mut out = io::stdout().lock();
    if customers.is_empty() {
        writeln!(out, "No customers found.")?;
    } else {
        render::customers(&mut out, customers)?;
    }
    Ok(())
}

fn handle_search(ctx: &AppContext, keyword: &str) -> Result<()> {
    let results = ctx.repo.search_customers(keyword);
    let mut out = io::stdout().lock();
    if results.is_empty() {
        writeln!(out, "No customers found matching: {}", keyword)?;
    } else {
        render::customers(&mut out, results)?;
    }
    Ok(())
}

fn handle_show(ctx: &AppContext, id: u32) -> Result<()> {
    let report = ctx
        .repo
        .generate_customer_report(id)
        .ok_or(CrmError::CustomerNotFound(id))?;
    let mut out = io::stdout().lock();
    render::customer_report(&mut out, &report)?;
    Ok(())
}

fn handle_report(ctx: &AppContext) -> Result<()> {
    let report = ctx.repo.generate_overall_report();
    let mut out = io::stdout().lock();
    render::overall_report(&mut out, &report)?;
    Ok(())
}
