use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use api_types::{
    category::CategoryType,
    report::{ExportFormat, Interval},
    transaction::TransactionType,
};

#[derive(Debug, Parser)]
#[command(name = "tally", about = "Personal finance from the command line")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://localhost:8000/api).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override log level.
    #[arg(long, global = true)]
    pub level: Option<String>,
    /// Override the file holding the saved session.
    #[arg(long, global = true)]
    pub state: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        /// Read from the terminal when not set.
        #[arg(long, env = "TALLY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account on the server and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TALLY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Me,
    /// Show the dashboard summary.
    Dashboard {
        /// Keep refreshing until interrupted.
        #[arg(long)]
        watch: bool,
    },
    Accounts,
    Categories {
        #[arg(long = "type", value_enum)]
        kind: Option<CategoryKindArg>,
        /// Print nested by parent.
        #[arg(long)]
        tree: bool,
    },
    Transactions(TransactionArgs),
    AddTransaction {
        #[arg(long)]
        account: i64,
        #[arg(long)]
        category: i64,
        #[arg(long = "type", value_enum, default_value = "expense")]
        kind: TransactionKindArg,
        /// Decimal amount, `.` or `,` separated.
        #[arg(long)]
        amount: String,
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    DeleteTransaction {
        id: i64,
    },
    /// Upload a CSV of transactions.
    Import {
        file: PathBuf,
    },
    /// Download transactions as CSV.
    Export {
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        filters: TransactionArgs,
    },
    Budgets {
        /// Reference date for local utilization; defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    Goals,
    Contribute {
        id: i64,
        amount: String,
    },
    Withdraw {
        id: i64,
        amount: String,
    },
    /// Income/expense report over a date range.
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TransactionArgs {
    #[arg(long)]
    pub account: Option<i64>,
    #[arg(long)]
    pub category: Option<i64>,
    #[arg(long = "type", value_enum)]
    pub kind: Option<TransactionKindArg>,
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub page: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub from: NaiveDate,
    #[arg(long)]
    pub to: NaiveDate,
    #[arg(long, value_enum, default_value = "monthly")]
    pub interval: IntervalArg,
    #[arg(long)]
    pub account: Option<i64>,
    #[arg(long)]
    pub category: Option<i64>,
    /// Write the locally computed report as CSV.
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// Download the server-rendered report instead.
    #[arg(long, value_enum, requires = "output")]
    pub server_export: Option<ExportFormatArg>,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryKindArg {
    Income,
    Expense,
}

impl From<CategoryKindArg> for CategoryType {
    fn from(value: CategoryKindArg) -> Self {
        match value {
            CategoryKindArg::Income => Self::Income,
            CategoryKindArg::Expense => Self::Expense,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransactionKindArg {
    Income,
    Expense,
    Transfer,
}

impl From<TransactionKindArg> for TransactionType {
    fn from(value: TransactionKindArg) -> Self {
        match value {
            TransactionKindArg::Income => Self::Income,
            TransactionKindArg::Expense => Self::Expense,
            TransactionKindArg::Transfer => Self::Transfer,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IntervalArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<IntervalArg> for Interval {
    fn from(value: IntervalArg) -> Self {
        match value {
            IntervalArg::Daily => Self::Daily,
            IntervalArg::Weekly => Self::Weekly,
            IntervalArg::Monthly => Self::Monthly,
            IntervalArg::Yearly => Self::Yearly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormatArg {
    Csv,
    Pdf,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Csv => Self::Csv,
            ExportFormatArg::Pdf => Self::Pdf,
        }
    }
}
