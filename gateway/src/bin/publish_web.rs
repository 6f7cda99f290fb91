//! Uploads the static web client to an object store, pointing it at the
//! deployed API on the way.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use disruption_core::assets::{publish_directory, DirectoryStore, HttpObjectStore, ObjectStore};
use disruption_core::config::{aws_credentials_from_env, DEFAULT_REGION};
use disruption_core::signing::{RequestAuth, SigV4Signer};

#[derive(Debug, Parser)]
#[command(name = "publish-web", about = "Upload the web client to an object store")]
struct Args {
    /// Directory holding the web client.
    #[arg(long, default_value = "web")]
    web_dir: PathBuf,

    /// Bucket base URL; each file is PUT to `{bucket_url}/{key}`.
    #[arg(long, env = "WEB_BUCKET_URL", required_unless_present = "out_dir")]
    bucket_url: Option<String>,

    /// Write into a local directory instead of uploading.
    #[arg(long, conflicts_with = "bucket_url")]
    out_dir: Option<PathBuf>,

    /// Deployed API base URL, substituted into app.js.
    #[arg(long, env = "API_URL")]
    api_url: Option<String>,

    /// Region used to SigV4-sign uploads with the AWS_* environment keys.
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Sent instead of a SigV4 signature when set.
    #[arg(long, env = "OBJECT_STORE_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,
}

fn object_store_auth(args: &Args) -> RequestAuth {
    match (&args.bearer_token, aws_credentials_from_env()) {
        (Some(token), _) => RequestAuth::Bearer(token.clone()),
        (None, Some(credentials)) => RequestAuth::SigV4(
            SigV4Signer::new(credentials, args.region.as_str(), "s3").with_payload_checksum(),
        ),
        (None, None) => RequestAuth::Anonymous,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let store: Box<dyn ObjectStore> = match (&args.out_dir, &args.bucket_url) {
        (Some(out_dir), _) => Box::new(DirectoryStore::new(out_dir)),
        (None, Some(bucket_url)) => Box::new(
            HttpObjectStore::new(bucket_url.as_str(), object_store_auth(&args))
                .context("Failed to build object store client")?,
        ),
        (None, None) => anyhow::bail!("either --bucket-url or --out-dir is required"),
    };

    info!("API URL: {}", args.api_url.as_deref().unwrap_or("(unchanged)"));
    info!("Target:  {}", store.describe());

    let count = publish_directory(&args.web_dir, store.as_ref(), args.api_url.as_deref())
        .await
        .with_context(|| format!("Failed to publish {}", args.web_dir.display()))?;

    info!("Published {} file(s)", count);
    Ok(())
}
