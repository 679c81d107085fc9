use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "powledger-cli")]
#[command(about = "CLI client for a powledger node")]
struct Cli {
    /// Node base URL (e.g. http://192.168.0.5:5000)
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: u64,
        /// Explicit transaction id; the node assigns one when omitted
        #[arg(long)]
        uuid: Option<String>,
    },
    /// Mine the pending transactions into a block
    Mine,
    /// Print the node's full chain
    Chain,
    /// List the peers the node knows
    Nodes,
    /// Add a peer (host:port) to the node
    Register { address: String },
    /// Exchange peer lists with every known peer
    Search,
    /// Run consensus on the node
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/').to_string();
    let client = Client::new();

    let res = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
            uuid,
        } => {
            let tx = Tx {
                sender,
                recipient,
                amount,
                uuid,
            };
            client
                .post(format!("{node}/transactions/new"))
                .json(&json!({ "transaction": tx }))
                .send()
                .await?
        }
        Command::Mine => client.get(format!("{node}/mine")).send().await?,
        Command::Chain => client.get(format!("{node}/chain")).send().await?,
        Command::Nodes => client.get(format!("{node}/nodes")).send().await?,
        Command::Register { address } => {
            client
                .post(format!("{node}/nodes/register"))
                .json(&json!({ "address": address }))
                .send()
                .await?
        }
        Command::Search => client.get(format!("{node}/nodes/search")).send().await?,
        Command::Resolve => client.get(format!("{node}/nodes/resolve")).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    debug!(%status, url = %res.url(), "node replied");
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
