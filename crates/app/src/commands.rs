use std::{fs, io::BufRead, path::Path};

use chrono::{Local, NaiveDate};
use tracing::info;

use api_types::{
    account::Account,
    auth::{LoginCredentials, RegisterData},
    budget::Budget,
    category::Category,
    dashboard::Dashboard,
    report::ReportFilters,
    transaction::{TransactionFilters, TransactionNew, TransactionType},
};
use client::{DashboardRefresher, Session};
use engine::{
    Report, aggregates,
    money::{format_amount, format_money, format_percentage, parse_amount},
};

use crate::{
    cli::{Command, ReportArgs, TransactionArgs},
    config::AppConfig,
    error::{AppError, Result},
    export,
    local_state::LocalState,
};

pub async fn run(session: &Session, state: &mut LocalState, settings: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let auth = session
                .login(&LoginCredentials {
                    email: email.trim().to_string(),
                    password,
                })
                .await?;
            state.sign_in(&auth.token, &auth.user.email);
            state.save(&settings.state_path)?;
            println!("Signed in as {} <{}>", auth.user.name, auth.user.email);
        }
        Command::Register { name, email, password } => {
            let password = password_or_prompt(password)?;
            let auth = session
                .register(&RegisterData {
                    name,
                    email: email.trim().to_string(),
                    password: password.clone(),
                    password_confirmation: password,
                })
                .await?;
            state.sign_in(&auth.token, &auth.user.email);
            state.save(&settings.state_path)?;
            println!("Welcome, {}", auth.user.name);
        }
        Command::Logout => {
            let result = session.logout().await;
            state.sign_out();
            state.save(&settings.state_path)?;
            result?;
            println!("Signed out");
        }
        Command::Me => {
            let user = session.me().await?;
            println!("{} <{}> (#{})", user.name, user.email, user.id);
        }
        Command::Dashboard { watch } => {
            let dashboard = session.dashboard().await?;
            print_dashboard(&dashboard);
            if watch {
                watch_dashboard(session, settings).await?;
            }
        }
        Command::Accounts => {
            let accounts = session.accounts().await?;
            print_accounts(&accounts);
        }
        Command::Categories { kind, tree } => {
            let categories = session.categories(kind.map(Into::into)).await?;
            if tree {
                for root in engine::build_tree(&categories) {
                    print_category(&root, 0);
                }
            } else {
                for category in categories.iter() {
                    println!("{:>5}  {:<8} {}", category.id, category.kind.as_str(), category.name);
                }
            }
        }
        Command::Transactions(args) => {
            let page = session.transactions(&transaction_filters(&args)).await?;
            for tx in &page.data {
                println!(
                    "{:>6}  {}  {:<8} {:>14}  {}",
                    tx.id,
                    tx.transaction_date,
                    tx.kind.as_str(),
                    signed_amount(tx.kind, tx.amount),
                    tx.description.as_deref().unwrap_or("")
                );
            }
            println!(
                "page {}/{} ({} total)",
                page.meta.current_page, page.meta.last_page, page.meta.total
            );
        }
        Command::AddTransaction {
            account,
            category,
            kind,
            amount,
            date,
            description,
        } => {
            let created = session
                .create_transaction(&TransactionNew {
                    account_id: account,
                    category_id: category,
                    kind: kind.into(),
                    amount: parse_amount(&amount)?,
                    transaction_date: date.unwrap_or_else(today),
                    description,
                    notes: None,
                    tags: None,
                })
                .await?;
            println!("Created transaction #{}", created.id);
        }
        Command::DeleteTransaction { id } => {
            session.delete_transaction(id).await?;
            println!("Deleted transaction #{id}");
        }
        Command::Import { file } => {
            let contents = fs::read(&file)?;
            let name = file_name(&file);
            session.import_transactions(&name, contents).await?;
            println!("Imported {name}");
        }
        Command::Export { output, filters } => {
            let bytes = session.export_transactions(&transaction_filters(&filters)).await?;
            fs::write(&output, &bytes)?;
            println!("Wrote {} bytes to {}", bytes.len(), output.display());
        }
        Command::Budgets { as_of } => {
            let budgets = session.budgets().await?;
            let as_of = as_of.unwrap_or_else(today);
            for budget in budgets.iter() {
                print_budget(session, budget, as_of).await?;
            }
        }
        Command::Goals => {
            let goals = session.goals().await?;
            for goal in goals.iter() {
                let progress = aggregates::goal_progress(goal.current_amount, goal.target_amount);
                let remaining = aggregates::goal_remaining(goal.current_amount, goal.target_amount);
                println!(
                    "{:>4}  {:<20} {:>7}  {} of {} ({} to go) [{}]",
                    goal.id,
                    goal.name,
                    format_percentage(progress),
                    format_amount(goal.current_amount, 2),
                    format_amount(goal.target_amount, 2),
                    format_amount(remaining, 2),
                    goal.status.as_str()
                );
            }
        }
        Command::Contribute { id, amount } => {
            let goal = session.contribute(id, parse_amount(&amount)?).await?;
            println!("{}: {}", goal.name, format_amount(goal.current_amount, 2));
        }
        Command::Withdraw { id, amount } => {
            let goal = session.withdraw(id, parse_amount(&amount)?).await?;
            println!("{}: {}", goal.name, format_amount(goal.current_amount, 2));
        }
        Command::Report(args) => report(session, args).await?,
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import.csv".to_string())
}

fn transaction_filters(args: &TransactionArgs) -> TransactionFilters {
    TransactionFilters {
        account_id: args.account,
        category_id: args.category,
        kind: args.kind.map(Into::into),
        start_date: args.from,
        end_date: args.to,
        search: args.search.clone(),
        page: args.page,
        ..Default::default()
    }
}

fn signed_amount(kind: TransactionType, amount: f64) -> String {
    match kind {
        TransactionType::Income => format!("+{}", format_amount(amount, 2)),
        TransactionType::Expense => format!("-{}", format_amount(amount, 2)),
        TransactionType::Transfer => format_amount(amount, 2),
    }
}

fn print_accounts(accounts: &[Account]) {
    for account in accounts {
        let marker = if account.is_active { "" } else { " (inactive)" };
        println!(
            "{:>4}  {:<20} {:<10} {:>16}{}",
            account.id,
            account.name,
            account.kind.as_str(),
            format_money(account.balance, &account.currency),
            marker
        );
    }
}

fn print_category(category: &Category, depth: usize) {
    println!("{}{} (#{})", "  ".repeat(depth), category.name, category.id);
    for child in category.children.iter().flatten() {
        print_category(child, depth + 1);
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    println!("Balance   {:>14}", format_amount(dashboard.total_balance, 2));
    println!("Income    {:>14}", format_amount(dashboard.total_income, 2));
    println!("Expenses  {:>14}", format_amount(dashboard.total_expenses, 2));
    println!("Net       {:>14}", format_amount(dashboard.net_income, 2));
    if !dashboard.spending_by_category.is_empty() {
        println!();
        for row in &dashboard.spending_by_category {
            println!(
                "  {:<20} {:>14} {:>7}",
                row.category_name,
                format_amount(row.total_amount, 2),
                format_percentage(row.percentage)
            );
        }
    }
}

async fn watch_dashboard(session: &Session, settings: &AppConfig) -> Result<()> {
    let interval = settings.refresh_interval();
    info!("refreshing dashboard every {}s", interval.as_secs());
    let mut refresher = DashboardRefresher::start(session.clone(), interval);
    let mut updates = refresher.updates();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = updates.borrow_and_update().clone();
                if let Some(dashboard) = latest {
                    println!();
                    print_dashboard(&dashboard);
                }
            }
        }
    }
    refresher.stop();
    Ok(())
}

async fn print_budget(session: &Session, budget: &Budget, as_of: NaiveDate) -> Result<()> {
    let name = budget
        .category
        .as_ref()
        .map_or("Overall", |category| category.name.as_str());

    // Prefer the server's figures; compute locally when it sends none.
    let (spent, percentage, remaining, over) = match budget.utilization {
        Some(usage) => (
            usage.spent,
            usage.percentage,
            usage.remaining,
            aggregates::is_over_budget(usage.spent, budget.amount),
        ),
        None => {
            let usage = session.budget_usage(budget, as_of).await?;
            (usage.spent, usage.percentage, usage.remaining, usage.is_over_budget())
        }
    };

    println!(
        "{:>4}  {:<20} {:<8} {:>12} of {:>12} {:>7}  {} left{}{}",
        budget.id,
        name,
        budget.period.as_str(),
        format_amount(spent, 2),
        format_amount(budget.amount, 2),
        format_percentage(percentage),
        format_amount(remaining, 2),
        if over { "  OVER" } else { "" },
        if budget.is_active { "" } else { " (inactive)" }
    );
    Ok(())
}

async fn report(session: &Session, args: ReportArgs) -> Result<()> {
    let filters = ReportFilters {
        start_date: args.from,
        end_date: args.to,
        account_id: args.account,
        category_id: args.category,
        interval: args.interval.into(),
    };

    if let Some(format) = args.server_export {
        let output = args
            .output
            .ok_or_else(|| AppError::Usage("--server-export needs --output".to_string()))?;
        let bytes = session.export_report(format.into(), &filters).await?;
        fs::write(&output, &bytes)?;
        println!("Wrote {} bytes to {}", bytes.len(), output.display());
        return Ok(());
    }

    let report = session.local_report(&filters).await?;
    print_report(&report);
    if let Some(path) = args.csv {
        fs::write(&path, export::report_csv(&report)?)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "{} .. {}",
        report.filters.start_date, report.filters.end_date
    );
    println!("Income    {:>14}", format_amount(report.totals.income, 2));
    println!("Expenses  {:>14}", format_amount(report.totals.expense, 2));
    println!("Net       {:>14}", format_amount(report.totals.net, 2));

    for (title, rows) in [
        ("Income by category", &report.income_by_category),
        ("Expenses by category", &report.expense_by_category),
    ] {
        if rows.is_empty() {
            continue;
        }
        println!("\n{title}");
        for row in rows {
            println!(
                "  {:<20} {:>14} {:>7}  ({} tx)",
                row.category_name,
                format_amount(row.amount, 2),
                format_percentage(row.percentage),
                row.transaction_count
            );
        }
    }

    println!("\nTrend");
    for bucket in &report.trend {
        println!(
            "  {:<10} {:>14} {:>14} {:>14}",
            bucket.label,
            format_amount(bucket.income, 2),
            format_amount(bucket.expense, 2),
            format_amount(bucket.net, 2)
        );
    }
}
