use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use ledger_core::{Block, MineOutcome};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the minimal ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Opaque transaction payload
        #[arg(long)]
        data: String,
    },
    /// Seal pending transactions into a new block
    Mine,
    /// Print every block
    Chain,
    /// Re-derive all hashes on the node and report the result
    Verify,
    /// Show the tip height and hash
    Head,
}

#[derive(Serialize)]
struct Tx {
    data: String,
}

struct Client {
    http: reqwest::Client,
    node: String,
}

impl Client {
    fn new(node: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            node: node.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.http.get(format!("{}{path}", self.node)).send().await?;
        Self::decode(res).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let res = self
            .http
            .post(format!("{}{path}", self.node))
            .json(body)
            .send()
            .await?;
        Self::decode(res).await
    }

    async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T> {
        let status = res.status();
        let body = res.text().await?;
        debug!(%status, %body, "node response");
        if !status.is_success() {
            bail!("node returned {status}: {body}");
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn describe(outcome: &MineOutcome) -> String {
    match outcome {
        MineOutcome::Mined { index, hash } => format!("mined block #{index} ({hash})"),
        MineOutcome::NothingToMine => "nothing to mine".to_string(),
        MineOutcome::Rejected => "mined block was rejected".to_string(),
        MineOutcome::BudgetExhausted => "no proof found within the mining budget".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = Client::new(cli.node);
    match cli.cmd {
        Command::Submit { data } => {
            let body: serde_json::Value = client.post("/tx", &Tx { data }).await?;
            println!("{body}");
        }
        Command::Mine => {
            let outcome: MineOutcome = client.post("/mine", &serde_json::json!({})).await?;
            println!("{}", describe(&outcome));
        }
        Command::Chain => {
            // Decoding validates each seal hash.
            let blocks: Vec<Block> = client.get("/chain").await?;
            for block in &blocks {
                println!("{block}  hash={}", block.seal_hash());
            }
        }
        Command::Verify => {
            let body: serde_json::Value = client.get("/chain/verify").await?;
            println!("{body}");
        }
        Command::Head => {
            let body: serde_json::Value = client.get("/chain/head").await?;
            println!("{body}");
        }
    }
    Ok(())
}
