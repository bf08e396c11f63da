//! Create-account function.
//!
//! Reads one API Gateway proxy event as JSON from stdin, runs it through the
//! create-account chain and prints the result as JSON.
//!
//! ```text
//! echo '{"httpMethod":"POST","path":"/accounts","body":"{\"id\":\"nat\"}"}' \
//!     | cargo run -p account-service
//! ```
//!
//! Configuration comes from an optional `catena.toml`, a `.env` file and
//! `CATENA__SECTION__KEY` environment variables.

mod account;

use anyhow::Context as _;
use catena::prelude::*;
use catena::telemetry::describe_metrics;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file("catena.toml")?
        .with_default_env()
        .load()
        .context("failed to load configuration")?;

    init_logging(&LogConfig::from(&config.logging)).context("failed to initialize logging")?;
    describe_metrics();

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("failed to read the event from stdin")?;
    let event: ApiGatewayProxyEvent =
        serde_json::from_str(&input).context("stdin is not an API Gateway proxy event")?;

    let context = LambdaContext {
        function_name: "account-service".to_string(),
        function_version: "$LATEST".to_string(),
        aws_request_id: RequestId::new().to_string(),
        ..LambdaContext::default()
    };

    let chain = account::create_account(&config);
    tracing::debug!(stages = ?chain.stage_names(), "chain ready");

    let result = handle(&chain, event, context).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
