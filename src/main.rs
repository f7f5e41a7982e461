// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use contractor_lookup::{
    format_currency, init_logging, ContractsOutcome, DataArgs, LookupEngine, SearchStatus,
    Session, SessionView,
};

#[derive(Parser, Debug)]
#[command(name = "contractor-lookup")]
#[command(about = "Search the contractor registry and review contract totals", version)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    Ui,

    /// Run a single lookup and print the result
    Search {
        /// Business name or address fragment
        query: String,

        /// Candidate to choose when several businesses match
        #[arg(long)]
        pick: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Search { query, pick, json }) => {
            init_logging("info");
            run_search(&cli.data, &query, pick.as_deref(), json)
        }
        Some(Command::Ui) | None => {
            // Keep log lines off the alternate screen
            init_logging("warn");
            run_ui_mode(&cli.data)
        }
    }
}

fn run_search(data: &DataArgs, query: &str, pick: Option<&str>, json: bool) -> Result<()> {
    let engine = LookupEngine::new(data.load()?);
    let mut session = Session::new();

    session.search(&engine, query);
    if let Some(name) = pick {
        session.select(name)?;
    }

    let view = session.view(&engine);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }

    if let Some(err) = view.error {
        bail!(err);
    }
    Ok(())
}

fn print_view(view: &SessionView) {
    println!("🏗️  Contractor Profile Lookup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match view.status {
        SearchStatus::AwaitingInput => {
            println!("⚠️  Please enter a business name or address.");
            return;
        }
        SearchStatus::NoMatch => {
            println!("❌ No registry records match {:?}.", view.query.trim());
            return;
        }
        SearchStatus::MultipleCandidates | SearchStatus::Resolved => {}
    }

    if view.candidates.len() > 1 {
        println!("\n🔎 Multiple businesses found:");
        for name in &view.candidates {
            let marker = if view.selected.as_deref() == Some(name.as_str()) { "→" } else { " " };
            println!("  {} {}", marker, name);
        }
        if view.needs_choice() {
            println!("\n   Re-run with --pick \"<name>\" to choose one.");
            return;
        }
    }

    let Some(profile) = &view.profile else {
        if let Some(err) = &view.error {
            println!("\n❌ {}", err);
        }
        return;
    };

    println!("\n📌 Business Profile for {}", profile.business_name);
    println!("   Business Name:          {}", profile.business_name);
    println!("   Address:                {}", profile.address);
    println!("   City, State, ZIP:       {}", profile.locality());
    println!("   Phone:                  {}", profile.phone);
    println!("   MWBE Status:            {}", profile.mwbe_status);
    println!("   Debarment:              {}", profile.debarment);
    println!("   Apprenticeship Program: {}", profile.apprenticeship_program);
    println!("   Violations:             {}", profile.violation_summary);

    if let Some(err) = &view.error {
        println!("\n❌ {}", err);
        return;
    }

    match &view.contracts {
        Some(ContractsOutcome::Found(summary)) => {
            println!("\n📑 Associated Contracts");
            println!("💰 Total Contract Amount: {}", summary.total_display());
            println!(
                "\n   {:<16} {:>18}  {:<12} {:<12} {}",
                "Contract ID", "Amount", "Start", "End", "Agency"
            );
            for line in &summary.lines {
                let amount = line
                    .amount
                    .map(format_currency)
                    .unwrap_or_else(|| "N/A".to_string());
                println!(
                    "   {:<16} {:>18}  {:<12} {:<12} {}",
                    line.contract_id, amount, line.start_date, line.end_date, line.agency
                );
            }
        }
        Some(ContractsOutcome::NoContracts) | None => {
            println!("\n❌ No contracts found for this contractor.");
        }
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(data: &DataArgs) -> Result<()> {
    println!("🖥️  Loading Contractor Lookup UI...\n");

    println!("📊 Loading registry and contracts...");
    let dataset = data.load()?;
    println!(
        "✓ Loaded {} registry records and {} contracts\n",
        dataset.registry.len(),
        dataset.contracts.len()
    );
    println!("Starting UI... (Press Esc to quit)\n");

    let mut app = ui::App::new(LookupEngine::new(dataset));
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_data: &DataArgs) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a single lookup: contractor-lookup search \"<name or address>\"");
    std::process::exit(1);
}
