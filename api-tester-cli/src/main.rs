use anyhow::{Context, Result};
use api_tester_core::config::{BASE_URL_ENV, TOKEN_ENV};
use api_tester_core::{
    ConsoleConfig, ConsoleError, HttpMethod, InvocationController, OperationDescriptor, ParameterMap,
};
use clap::{Parser, Subcommand};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod panel;

/// Regulon Client API Tester
///
/// Issues single canned or hand-built calls against the Regulon public API
/// and prints the raw response.
#[derive(Parser, Debug)]
#[command(name = "api-tester")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML). Defaults to ./api-tester.toml when present
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// API base URL, e.g. https://api.regulon.io/public_api/v1
    #[arg(long, value_name = "URL", env = BASE_URL_ENV, global = true)]
    base_url: Option<String>,

    /// Pre-issued bearer token
    #[arg(long, value_name = "TOKEN", env = TOKEN_ENV, hide_env_values = true, global = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered operations
    List,

    /// Invoke one operation and print its outcome
    Invoke {
        /// Operation index as shown by `list`
        index: usize,

        /// HTTP method (defaults to the operation's own method)
        #[arg(long)]
        method: Option<HttpMethod>,

        /// Path parameter, repeatable
        ///
        /// Example: --param individual_screening_id=40bdc96e-3a2a-451c-91db-bd85278e33cd
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// JSON request body
        #[arg(long, value_name = "JSON")]
        body: Option<String>,

        /// Start from the operation's canned payload; other flags override it
        #[arg(long)]
        sample: bool,
    },

    /// Fire every canned invocation concurrently
    RunAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let controller = InvocationController::from_config(&config)?;

    match cli.command {
        Commands::List => {
            print!("{}", panel::listing(controller.registry()));
            Ok(())
        }
        Commands::Invoke {
            index,
            method,
            params,
            body,
            sample,
        } => invoke_one(&controller, index, method, params, body, sample).await,
        Commands::RunAll => run_all(&controller).await,
    }
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::load_from(path)?,
        None => ConsoleConfig::load()?,
    };

    config.apply_overrides(|key| match key {
        TOKEN_ENV => cli.token.clone(),
        BASE_URL_ENV => cli.base_url.clone(),
        _ => None,
    });

    Ok(config)
}

/// Method, body and parameters for one `invoke`. With `sample` the
/// operation's canned payload is the base; explicit flags override it and
/// `--param` keys win over the canned ones.
fn call_arguments(
    descriptor: &OperationDescriptor,
    method: Option<HttpMethod>,
    raw_params: &[String],
    raw_body: Option<&str>,
    sample: bool,
) -> Result<(HttpMethod, Option<Value>, ParameterMap), ConsoleError> {
    let (base_method, base_body, base_params) = if sample {
        let sample = descriptor.sample.clone();
        (sample.method, sample.body, sample.params)
    } else {
        (descriptor.default_method, None, ParameterMap::new())
    };

    let mut flagged = ParameterMap::new();
    for raw in raw_params {
        let (key, value) = ParameterMap::parse_pair(raw)?;
        flagged.insert(key, value);
    }

    let body = match raw_body {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => base_body,
    };

    Ok((method.unwrap_or(base_method), body, base_params.merged(&flagged)))
}

async fn invoke_one(
    controller: &InvocationController,
    index: usize,
    method: Option<HttpMethod>,
    raw_params: Vec<String>,
    raw_body: Option<String>,
    sample: bool,
) -> Result<()> {
    let descriptor = controller.registry().descriptor(index)?.clone();
    let (method, body, params) =
        call_arguments(&descriptor, method, &raw_params, raw_body.as_deref(), sample)?;

    controller.invoke(index, Some(method), body, &params).await?;

    let state = controller
        .state(index)
        .context("operation state missing after invocation")?;
    print!("{}", panel::render(&descriptor, &state));
    Ok(())
}

async fn run_all(controller: &InvocationController) -> Result<()> {
    let mut in_flight = FuturesUnordered::new();
    for descriptor in controller.registry().iter() {
        let handle = controller.spawn_sample(descriptor.id)?;
        let index = descriptor.id;
        in_flight.push(async move { (index, handle.await) });
    }

    while let Some((index, joined)) = in_flight.next().await {
        if let Err(e) = joined {
            tracing::error!(operation = index, error = %e, "invocation task aborted");
        }
        let descriptor = controller.registry().descriptor(index)?;
        let state = controller
            .state(index)
            .context("operation state missing after invocation")?;
        println!("{}", panel::render(descriptor, &state));
    }

    println!("{}", panel::summary(&controller.snapshot()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_tester_core::EndpointRegistry;
    use serde_json::json;

    fn flags(pairs: &[&str]) -> Vec<String> {
        pairs.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_sample_supplies_base_values() {
        let registry = EndpointRegistry::regulon();
        let descriptor = registry.get(6).unwrap();

        let (method, body, params) = call_arguments(descriptor, None, &[], None, true).unwrap();
        assert_eq!(method, descriptor.sample.method);
        assert_eq!(body, descriptor.sample.body);
        assert_eq!(params, descriptor.sample.params);
    }

    #[test]
    fn test_flags_override_sample() {
        let registry = EndpointRegistry::regulon();
        let descriptor = registry.get(6).unwrap();

        let (method, body, params) = call_arguments(
            descriptor,
            Some(HttpMethod::Post),
            &flags(&["country=fr", "extra=1"]),
            Some(r#"{"override":true}"#),
            true,
        )
        .unwrap();

        assert_eq!(method, HttpMethod::Post);
        assert_eq!(body, Some(json!({"override": true})));
        assert_eq!(params.get("country"), Some("fr"));
        assert_eq!(params.get("extra"), Some("1"));
        assert_eq!(params.get("companyName"), descriptor.sample.params.get("companyName"));
    }

    #[test]
    fn test_without_sample_uses_operation_method_only() {
        let registry = EndpointRegistry::regulon();
        let descriptor = registry.get(0).unwrap();

        let (method, body, params) =
            call_arguments(descriptor, None, &flags(&["id=7"]), None, false).unwrap();
        assert_eq!(method, descriptor.default_method);
        assert_eq!(body, None);
        assert_eq!(params, ParameterMap::new().with("id", "7"));
    }

    #[test]
    fn test_bad_flags_are_rejected() {
        let registry = EndpointRegistry::regulon();
        let descriptor = registry.get(1).unwrap();

        assert!(matches!(
            call_arguments(descriptor, None, &flags(&["no-equals"]), None, false),
            Err(ConsoleError::InvalidParameter(_))
        ));
        assert!(matches!(
            call_arguments(descriptor, None, &[], Some("{not json"), false),
            Err(ConsoleError::InvalidBody(_))
        ));
    }
}
