use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mint-cli")]
#[command(about = "Command-line client for the kraznik-mint JSON API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show session and contract state
    Status,
    /// Authorize the signer account
    Connect,
    /// Forget the authorized account
    Disconnect,
    /// Mint tokens and wait for confirmation
    Mint {
        #[arg(short, long)]
        quantity: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/api/state", base)).send().await?,
        Commands::Connect => client.post(format!("{}/api/connect", base)).send().await?,
        Commands::Disconnect => client.post(format!("{}/api/disconnect", base)).send().await?,
        Commands::Mint { quantity } => {
            client
                .post(format!("{}/api/mint", base))
                .json(&json!({ "quantity": quantity }))
                .send()
                .await?
        }
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: mint API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
