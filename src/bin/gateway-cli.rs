use clap::{Args, Parser, Subcommand};
use reqwest::Url;
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the ledger gateway asset API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the ledger with the sample assets
    Init,
    /// List every asset
    List,
    /// Show one asset
    Get { id: String },
    /// Show the transaction history of an asset
    History { id: String },
    /// Create an asset
    Create(AssetArgs),
    /// Update an existing asset
    Update(AssetArgs),
    /// Transfer an asset to a new owner
    Transfer { id: String, new_owner: String },
    /// Check that the gateway is up
    Health,
}

#[derive(Args)]
struct AssetArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    dealer_id: String,
    #[arg(long)]
    msisdn: String,
    #[arg(long)]
    mpin: String,
    #[arg(long)]
    balance: i64,
    #[arg(long, default_value = "active")]
    status: String,
    #[arg(long)]
    trans_amount: Option<i64>,
    #[arg(long)]
    trans_type: Option<String>,
    #[arg(long)]
    remarks: Option<String>,
}

impl AssetArgs {
    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("id".into(), json!(self.id));
        body.insert("dealerId".into(), json!(self.dealer_id));
        body.insert("msisdn".into(), json!(self.msisdn));
        body.insert("mpin".into(), json!(self.mpin));
        body.insert("balance".into(), json!(self.balance));
        body.insert("status".into(), json!(self.status));
        if let Some(amount) = self.trans_amount {
            body.insert("transAmount".into(), json!(amount));
        }
        if let Some(kind) = &self.trans_type {
            body.insert("transType".into(), json!(kind));
        }
        if let Some(remarks) = &self.remarks {
            body.insert("remarks".into(), json!(remarks));
        }
        Value::Object(body)
    }
}

/// Append `segments` to `base`, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("gateway URL cannot take a path: {}", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = Url::parse(&cli.url)?;

    let request = match &cli.command {
        Commands::Init => client.post(endpoint(&base, &["ledger", "init"])?),
        Commands::List => client.get(endpoint(&base, &["assets"])?),
        Commands::Get { id } => client.get(endpoint(&base, &["asset", id])?),
        Commands::History { id } => client.get(endpoint(&base, &["asset", id, "history"])?),
        Commands::Create(asset) => client
            .post(endpoint(&base, &["asset"])?)
            .json(&asset.to_body()),
        Commands::Update(asset) => client
            .put(endpoint(&base, &["asset"])?)
            .json(&asset.to_body()),
        Commands::Transfer { id, new_owner } => client
            .post(endpoint(&base, &["asset", "transfer"])?)
            .json(&json!({ "id": id, "newOwner": new_owner })),
        Commands::Health => client.get(endpoint(&base, &["health"])?),
    };

    let res = request.send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_asset_id() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let url = endpoint(&base, &["asset", "a/b?c#d", "history"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/asset/a%2Fb%3Fc%23d/history");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://gw.example.com/api/").unwrap();
        let url = endpoint(&base, &["assets"]).unwrap();
        assert_eq!(url.as_str(), "https://gw.example.com/api/assets");
    }

    #[test]
    fn test_endpoint_rejects_opaque_url() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(endpoint(&base, &["health"]).is_err());
    }
}
