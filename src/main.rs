mod commands;
mod config;
mod error;
mod mailgun;
mod models;

use clap::Parser;
use clap::error::ErrorKind;
use commands::Operation;
use config::Config;
use models::Output;
use std::ffi::OsString;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mg-template-migrate")]
#[command(
    version,
    about = "Copy or move Mailgun templates from MG_OLD_MAIL_DOMAIN to MG_NEW_MAIL_DOMAIN",
    long_about = None
)]
struct Cli {
    /// copy keeps the templates on the old domain, move deletes them once copied
    #[arg(value_enum)]
    operation: Operation,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let code = run(std::env::args_os(), Config::load).await;
    std::process::exit(code);
}

/// Parse arguments, resolve configuration and run the migration. Returns the exit code.
///
/// Nothing touches the network until both the argument and the configuration are valid.
async fn run<I, T>(args: I, load_config: impl FnOnce() -> error::Result<Config>) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            println!("{}", e.render());
            return 0;
        }
        Err(e) => {
            println!("{}", e.render());
            return 1;
        }
    };

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            Output::error(e.to_string()).print();
            return 1;
        }
    };

    match commands::migrate(&config, cli.operation).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Migration aborted");
            Output::error(e.to_string()).print();
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use reqwest::Url;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        Config {
            base_url: Url::parse(&format!("{}/v3", server.uri())).unwrap(),
            old_domain: "old.example.com".into(),
            new_domain: "new.example.com".into(),
            api_key: "key-123".into(),
        }
    }

    #[test]
    fn test_cli_accepts_operations() {
        let cli = Cli::try_parse_from(["mg-template-migrate", "copy"]).unwrap();
        assert_eq!(cli.operation, Operation::Copy);
        let cli = Cli::try_parse_from(["mg-template-migrate", "move"]).unwrap();
        assert_eq!(cli.operation, Operation::Move);
    }

    #[test]
    fn test_cli_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["mg-template-migrate"]).is_err());
        assert!(Cli::try_parse_from(["mg-template-migrate", "sync"]).is_err());
        assert!(Cli::try_parse_from(["mg-template-migrate", "copy", "move"]).is_err());
    }

    #[tokio::test]
    async fn test_invalid_operation_exits_before_config() {
        let code = run(["mg-template-migrate", "sync"], || {
            panic!("configuration must not be loaded for an invalid argument")
        })
        .await;
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_missing_argument_exits_1() {
        let code = run(["mg-template-migrate"], || {
            panic!("configuration must not be loaded without an argument")
        })
        .await;
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_missing_config_exits_1() {
        let code = run(["mg-template-migrate", "copy"], || {
            Err(Error::MissingConfig {
                old_domain: "None".into(),
                new_domain: "None".into(),
                api_key: "None".into(),
            })
        })
        .await;
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_empty_source_domain_exits_0() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/old.example.com/templates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let code = run(["mg-template-migrate", "move"], move || Ok(config)).await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_copy_two_templates_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/old.example.com/templates"))
            .respond_with(move |req: &wiremock::Request| {
                let next = req.url.query_pairs().any(|(k, _)| k == "p");
                let items = if next {
                    json!([])
                } else {
                    json!([{"name": "a"}, {"name": "b"}])
                };
                ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
            })
            .expect(2)
            .mount(&server)
            .await;
        for name in ["a", "b"] {
            Mock::given(method("GET"))
                .and(path(format!("/v3/old.example.com/templates/{name}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "template": {
                        "description": name,
                        "version": {"tag": "v1", "template": "<p>x</p>", "headers": {}}
                    }
                })))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/v3/new.example.com/templates"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "template has been stored"})),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/old.example.com/templates/a"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let code = run(["mg-template-migrate", "copy"], move || Ok(config)).await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_create_failure_still_exits_0() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/old.example.com/templates"))
            .respond_with(move |req: &wiremock::Request| {
                let next = req.url.query_pairs().any(|(k, _)| k == "p");
                let items = if next { json!([]) } else { json!([{"name": "a"}]) };
                ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
            })
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v3/old.example.com/templates/a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "template": {"version": {"template": "<p>x</p>"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/new.example.com/templates"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/old.example.com/templates/a"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let code = run(["mg-template-migrate", "move"], move || Ok(config)).await;
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_unusable_base_url_exits_1() {
        let config = Config {
            base_url: Url::parse("mailto:ops@example.com").unwrap(),
            old_domain: "old.example.com".into(),
            new_domain: "new.example.com".into(),
            api_key: "key".into(),
        };
        let code = run(["mg-template-migrate", "copy"], move || Ok(config)).await;
        assert_eq!(code, 1);
    }
}
