use std::{env, io, path::PathBuf, process::exit};

use clap::{Parser, Subcommand};

use finance_tracker::{
    Transaction, TransactionId, TransactionPatch, TransactionRequest,
    client::{ApiClient, ClientError, SessionCache},
};

/// A command line client for the personal finance tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the server.
    #[arg(long, env = "FINANCE_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Where the signed-in session is kept. Defaults to `~/.finance_session.json`.
    #[arg(long, env = "FINANCE_SESSION")]
    session_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Sign in to an existing account.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Forget the saved session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List transactions, most recent first.
    List,
    /// Show a single transaction.
    Show { id: TransactionId },
    /// Record a new transaction. Use a negative amount for an expense.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
        #[arg(long)]
        category: String,
        /// A date (YYYY-MM-DD) or RFC 3339 timestamp. Defaults to now.
        #[arg(long)]
        date: Option<String>,
    },
    /// Change some fields of a transaction.
    Edit {
        id: TransactionId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a transaction.
    Delete { id: TransactionId },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(error) = run(args).await {
        eprintln!("Error: {error}");

        if let ClientError::Unauthorized(_) | ClientError::NotLoggedIn = error {
            eprintln!("Log in again with `finance login --email <EMAIL>`.");
        }

        exit(1);
    }
}

async fn run(args: Args) -> Result<(), ClientError> {
    let session_path = args.session_path.unwrap_or_else(default_session_path);
    let session = SessionCache::load(session_path)?;
    let mut client = ApiClient::new(&args.server, session);

    match args.command {
        Command::Register { name, email } => {
            let password = prompt_password()?;
            let user = client.register(&name, &email, &password).await?;
            println!("Registered and logged in as {} <{}>", user.name, user.email);
        }
        Command::Login { email } => {
            let password = prompt_password()?;
            let user = client.log_in(&email, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            client.log_out()?;
            println!("Logged out");
        }
        Command::Whoami => match client.session().user() {
            Some(user) => println!("{} <{}> (id {})", user.name, user.email, user.id),
            None => println!("Not logged in"),
        },
        Command::List => {
            let transactions = client.list_transactions().await?;
            if transactions.is_empty() {
                println!("No transactions");
            }
            for transaction in &transactions {
                print_transaction(transaction);
            }
        }
        Command::Show { id } => print_transaction(&client.get_transaction(id).await?),
        Command::Add {
            title,
            amount,
            category,
            date,
        } => {
            let request = TransactionRequest {
                title: Some(title),
                amount: Some(amount),
                date,
                category: Some(category),
            };
            print_transaction(&client.create_transaction(&request).await?);
        }
        Command::Edit {
            id,
            title,
            amount,
            category,
            date,
        } => {
            let patch = TransactionPatch {
                title,
                amount: amount.map(Some),
                date,
                category,
            };
            print_transaction(&client.update_transaction(id, &patch).await?);
        }
        Command::Delete { id } => println!("{}", client.delete_transaction(id).await?),
    }

    Ok(())
}

fn default_session_path() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".finance_session.json")
}

fn prompt_password() -> Result<String, io::Error> {
    rpassword::prompt_password("Password: ")
}

fn print_transaction(transaction: &Transaction) {
    println!(
        "#{:<5} {}  {:>12.2}  {:<20} {}",
        transaction.id,
        transaction.date.date(),
        transaction.amount,
        transaction.category,
        transaction.title
    );
}
