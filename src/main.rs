use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fintrack::AppCommand;
use fintrack::cli::ui;
use fintrack::core::log::init_logging;
use fintrack::core::transaction::{CategoryId, TransactionDraft, TransactionId, TransactionType};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Whose transactions to work with
    #[arg(short, long, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct TransactionArgs {
    /// income or expense
    #[arg(short = 't', long = "type")]
    kind: TransactionType,

    /// Category id, see `fintrack category list`
    #[arg(short = 'k', long)]
    category: u64,

    /// Amount in the given currency, at most two decimal places
    amount: Decimal,

    /// Currency code, e.g. USD
    currency: String,

    /// Date as YYYY-MM-DD, defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,
}

impl From<TransactionArgs> for TransactionDraft {
    fn from(args: TransactionArgs) -> Self {
        TransactionDraft {
            kind: args.kind,
            category_id: CategoryId(args.category),
            amount: args.amount,
            currency: args.currency.to_uppercase(),
            date: args.date.unwrap_or_else(today),
        }
    }
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Create a category
    Add { name: String },
    /// List categories
    List,
    /// Delete a category and every transaction filed under it
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the current exchange rates
    Rates,
    /// Convert an amount into the storage currency
    Convert { amount: Decimal, currency: String },
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommands),
    /// Record a transaction
    Add(TransactionArgs),
    /// Replace the fields of a transaction
    Edit {
        id: u64,
        #[command(flatten)]
        transaction: TransactionArgs,
    },
    /// Show one transaction
    Show { id: u64 },
    /// Delete a transaction
    Delete { id: u64 },
    /// List transactions, e.g. `list "transaction_type=expense&start_date=2024-01-01&page=2"`
    List { query: Option<String> },
    /// Overall totals plus a filtered page of transactions
    Overview { query: Option<String> },
    /// Income, expenses and spending breakdowns for the last 30 days
    Stats,
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Rates => AppCommand::Rates,
            Commands::Convert { amount, currency } => AppCommand::Convert {
                amount,
                currency: currency.to_uppercase(),
            },
            Commands::Category(CategoryCommands::Add { name }) => AppCommand::AddCategory { name },
            Commands::Category(CategoryCommands::List) => AppCommand::ListCategories,
            Commands::Category(CategoryCommands::Delete { id }) => AppCommand::DeleteCategory {
                id: CategoryId(id),
            },
            Commands::Add(args) => AppCommand::Add(args.into()),
            Commands::Edit { id, transaction } => AppCommand::Edit {
                id: TransactionId(id),
                draft: transaction.into(),
            },
            Commands::Show { id } => AppCommand::Show {
                id: TransactionId(id),
            },
            Commands::Delete { id } => AppCommand::Delete {
                id: TransactionId(id),
            },
            Commands::List { query } => AppCommand::List { query },
            Commands::Overview { query } => AppCommand::Overview { query },
            Commands::Stats => AppCommand::Stats { today: today() },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fintrack::cli::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => fintrack::run_command(cmd.into(), cli.config_path.as_deref(), &cli.user).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        if let Some(errors) = fintrack::validation_errors(e) {
            eprintln!(
                "{}\n{}",
                ui::style_text("Please correct the following:", ui::StyleType::Error),
                ui::format_validation_errors(errors)
            );
            std::process::exit(2);
        }
        tracing::error!(error = %e, "Application failed");
    }
    result
}
