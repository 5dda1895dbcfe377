use std::{error::Error, io::Write, path::PathBuf, sync::Arc};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    Console, Gender, Member, MemberNew, MembershipPlan, Money, PaymentStatus, SqliteStore,
    Supplement, SupplementNew,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "kvfit_admin")]
#[command(about = "Admin utilities for the KV Fitness console (members, sales, reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./kvfit.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Member(MemberArgs),
    Supplement(SupplementArgs),
    /// Print dashboard figures.
    Report {
        /// Reference day, defaults to today (UTC).
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
struct MemberArgs {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Register(MemberRegisterArgs),
    List,
    Delete {
        id: String,
    },
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct MemberRegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: u32,
    /// Male, Female or Other.
    #[arg(long, value_parser = parse_gender)]
    gender: Gender,
    #[arg(long)]
    contact: Option<String>,
    /// One of "15 Days", "1 Month", "2 Months", "3 Months", "6 Months", "1 Year".
    #[arg(long, value_parser = parse_plan)]
    plan: MembershipPlan,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long, value_parser = parse_money)]
    fees: Money,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    paid: Money,
    #[arg(long, value_parser = parse_status)]
    status: Option<PaymentStatus>,
    #[arg(long)]
    expected_payment: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    remarks: String,
}

#[derive(Args, Debug)]
struct SupplementArgs {
    #[command(subcommand)]
    command: SupplementCommand,
}

#[derive(Subcommand, Debug)]
enum SupplementCommand {
    Add(SupplementAddArgs),
    List {
        /// Only the sales of this member.
        #[arg(long)]
        member: Option<String>,
    },
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SupplementAddArgs {
    #[arg(long)]
    member: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_money)]
    amount: Money,
    #[arg(long, value_parser = parse_money, default_value = "0")]
    paid: Money,
    #[arg(long, value_parser = parse_status)]
    status: Option<PaymentStatus>,
    #[arg(long)]
    expected_payment: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    remarks: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output file, stdout when missing.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_gender(raw: &str) -> Result<Gender, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "male" | "m" => Ok(Gender::Male),
        "female" | "f" => Ok(Gender::Female),
        "other" => Ok(Gender::Other),
        other => Err(format!("unsupported gender: {other}")),
    }
}

fn parse_plan(raw: &str) -> Result<MembershipPlan, String> {
    MembershipPlan::try_from(raw).map_err(|err| err.to_string())
}

fn parse_status(raw: &str) -> Result<PaymentStatus, String> {
    PaymentStatus::try_from(raw).map_err(|err| err.to_string())
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberRow<'a> {
    id: &'a str,
    full_name: &'a str,
    age: u32,
    gender: Gender,
    contact_number: &'a str,
    membership_plan: &'static str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    gym_fees: String,
    payment_status: &'static str,
    amount_paid: String,
    due_amount: String,
    expected_payment_date: Option<NaiveDate>,
    remarks: &'a str,
}

impl<'a> From<&'a Member> for MemberRow<'a> {
    fn from(member: &'a Member) -> Self {
        Self {
            id: &member.id,
            full_name: &member.full_name,
            age: member.age,
            gender: member.gender,
            contact_number: member.contact_number.as_deref().unwrap_or_default(),
            membership_plan: member.membership_plan.label(),
            start_date: member.start_date,
            end_date: member.end_date,
            gym_fees: member.gym_fees.to_string(),
            payment_status: member.payment_status.label(),
            amount_paid: member.amount_paid.to_string(),
            due_amount: member.due_amount.to_string(),
            expected_payment_date: member.expected_payment_date,
            remarks: &member.remarks,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SupplementRow<'a> {
    id: &'a str,
    member_id: &'a str,
    member_name: &'a str,
    purchase_date: NaiveDate,
    supplement_amount: String,
    payment_status: &'static str,
    amount_paid: String,
    due_amount: String,
    expected_payment_date: Option<NaiveDate>,
    remarks: &'a str,
}

impl<'a> From<&'a Supplement> for SupplementRow<'a> {
    fn from(supplement: &'a Supplement) -> Self {
        Self {
            id: &supplement.id,
            member_id: &supplement.member_id,
            member_name: &supplement.member_name,
            purchase_date: supplement.purchase_date,
            supplement_amount: supplement.supplement_amount.to_string(),
            payment_status: supplement.payment_status.label(),
            amount_paid: supplement.amount_paid.to_string(),
            due_amount: supplement.due_amount.to_string(),
            expected_payment_date: supplement.expected_payment_date,
            remarks: &supplement.remarks,
        }
    }
}

fn export<R: Serialize>(
    rows: impl IntoIterator<Item = R>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter("kvfit_admin=warn,engine=warn")
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let console = Console::builder()
        .store(Arc::new(SqliteStore::new(db)))
        .build()
        .await?;

    match cli.command {
        Command::Member(MemberArgs { command }) => match command {
            MemberCommand::Register(args) => {
                let outcome = console
                    .register_member(MemberNew {
                        full_name: args.name,
                        age: args.age,
                        gender: args.gender,
                        contact_number: args.contact,
                        membership_plan: args.plan,
                        start_date: args.start,
                        end_date: None,
                        gym_fees: args.fees,
                        payment_status: args.status,
                        amount_paid: args.paid,
                        expected_payment_date: args.expected_payment,
                        remarks: args.remarks,
                        photo: None,
                    })
                    .await?;
                println!("{} ({})", outcome.notification.message, outcome.value.id);
            }
            MemberCommand::List => {
                for member in console.members().await {
                    println!(
                        "{}\t{}\t{}\t{} -> {}\tdue {}",
                        member.id,
                        member.full_name,
                        member.membership_plan.label(),
                        member.start_date,
                        member.end_date,
                        member.due_amount
                    );
                }
            }
            MemberCommand::Delete { id } => {
                let outcome = console.delete_member(&id).await?;
                println!(
                    "{} ({id}, {} supplements)",
                    outcome.notification.message,
                    outcome.value.len()
                );
            }
            MemberCommand::Export(args) => {
                let members = console.members().await;
                export(members.iter().map(MemberRow::from), args.output)?;
            }
        },
        Command::Supplement(SupplementArgs { command }) => match command {
            SupplementCommand::Add(args) => {
                let outcome = match console
                    .add_supplement(SupplementNew {
                        member_id: args.member,
                        purchase_date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
                        supplement_amount: args.amount,
                        payment_status: args.status,
                        amount_paid: args.paid,
                        expected_payment_date: args.expected_payment,
                        remarks: args.remarks,
                    })
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(err @ engine::EngineError::MemberNotFound(_)) => {
                        eprintln!("{err}");
                        std::process::exit(1);
                    }
                    Err(err) => return Err(err.into()),
                };
                println!("{} ({})", outcome.notification.message, outcome.value.id);
            }
            SupplementCommand::List { member } => {
                let supplements = match member {
                    Some(member_id) => console.supplements_for(&member_id).await,
                    None => console.supplements().await,
                };
                for supplement in supplements {
                    println!(
                        "{}\t{}\t{}\t{}\t{}\tdue {}",
                        supplement.id,
                        supplement.member_id,
                        supplement.member_name,
                        supplement.purchase_date,
                        supplement.supplement_amount,
                        supplement.due_amount
                    );
                }
            }
            SupplementCommand::Export(args) => {
                let supplements = console.supplements().await;
                export(supplements.iter().map(SupplementRow::from), args.output)?;
            }
        },
        Command::Report { today } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let stats = console.report(today).await;
            println!("Report for {today}");
            println!("New members this month: {}", stats.new_members);
            println!("Active members:         {}", stats.active_members);
            println!("Expired members:        {}", stats.expired_members);
            println!("Gym fees collected:     {}", stats.gym_collected);
            println!("Gym fees due:           {}", stats.gym_due);
            println!("Supplement sales:       {}", stats.supplement_sales);
            println!("Supplement dues:        {}", stats.supplement_due);
            println!("Supplements sold:       {}", stats.supplements_sold);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_values() {
        assert_eq!(parse_gender("F"), Ok(Gender::Female));
        assert!(parse_gender("robot").is_err());
        assert_eq!(parse_plan("3 months"), Ok(MembershipPlan::ThreeMonths));
        assert_eq!(parse_money("1500.50"), Ok(Money::new(150_050)));
        assert_eq!(parse_status("not paid"), Ok(PaymentStatus::NotPaid));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn plan_help_lists_every_plan() {
        use clap::CommandFactory;

        let cli = Cli::command();
        let register = cli
            .find_subcommand("member")
            .and_then(|member| member.find_subcommand("register"))
            .unwrap();
        let help = register
            .get_arguments()
            .find(|arg| arg.get_id() == "plan")
            .and_then(|arg| arg.get_help())
            .unwrap()
            .to_string();

        for plan in MembershipPlan::ALL {
            assert!(help.contains(plan.label()), "missing {}", plan.label());
        }
    }

    #[test]
    fn member_rows_use_labels_and_decimal_amounts() {
        let member = Member {
            id: "KV0001".to_string(),
            full_name: "Asha Rao".to_string(),
            age: 29,
            gender: Gender::Female,
            contact_number: None,
            membership_plan: MembershipPlan::OneMonth,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            gym_fees: Money::new(150_000),
            payment_status: PaymentStatus::NotPaid,
            amount_paid: Money::ZERO,
            due_amount: Money::new(150_000),
            expected_payment_date: None,
            remarks: String::new(),
            registration_date: Utc::now(),
            photo: Some("aGVsbG8=".to_string()),
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(MemberRow::from(&member)).unwrap();
        let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let mut lines = data.lines();

        assert!(lines.next().unwrap().starts_with("id,fullName,age,gender"));
        let row = lines.next().unwrap();
        assert!(row.contains("1 Month"));
        assert!(row.contains("Not Paid"));
        assert!(row.contains("1500.00"));
        assert!(!row.contains("aGVsbG8="));
    }
}
