use crate::config::Config;
use crate::mailgun::{MailgunClient, TemplateApi};
use crate::models::NewTemplate;
use clap::ValueEnum;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    /// Duplicate templates onto the new domain
    Copy,
    /// Duplicate templates, then delete them from the old domain
    Move,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Copy => write!(f, "copy"),
            Operation::Move => write!(f, "move"),
        }
    }
}

/// What happened to one template during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FetchFailed,
    CreateFailed,
    Copied,
    Moved,
    /// Created on the new domain but still present on the old one.
    DeleteFailed,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub outcomes: Vec<(String, Outcome)>,
}

impl MigrationReport {
    #[cfg(test)]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Walk every listing page until an empty one comes back.
///
/// A failed page stops the walk and whatever was collected so far is returned.
pub async fn list_all_templates<A: TemplateApi>(api: &A) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match api.list_page(cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, "Failed to list templates");
                break;
            }
        };

        let Some(last) = page.last().map(|t| t.name.clone()) else {
            break;
        };
        if cursor.as_deref() == Some(last.as_str()) {
            warn!(cursor = %last, "Listing did not advance, stopping");
            break;
        }

        names.extend(page.into_iter().map(|t| t.name));
        cursor = Some(last);
    }

    names
}

/// `Template(s) to copy: a,b`, or `None` when nothing was listed.
fn listing_summary(operation: Operation, names: &[String]) -> String {
    let listed = if names.is_empty() {
        "None".to_string()
    } else {
        names.join(",")
    };
    format!("Template(s) to {operation}: {listed}")
}

/// Copy (and for `move`, delete) every template on the old domain, one at a time.
pub async fn run_migration<A: TemplateApi>(
    api: &A,
    config: &Config,
    operation: Operation,
) -> MigrationReport {
    info!("Fetching all templates under domain {}", config.old_domain);
    let names = list_all_templates(api).await;

    info!("{}", listing_summary(operation, &names));

    let mut report = MigrationReport::default();
    for name in names {
        let outcome = migrate_one(api, config, operation, &name).await;
        report.outcomes.push((name, outcome));
    }
    report
}

async fn migrate_one<A: TemplateApi>(
    api: &A,
    config: &Config,
    operation: Operation,
    name: &str,
) -> Outcome {
    info!("Copying template {name} to domain {}", config.new_domain);

    let detail = match api.fetch_template(name).await {
        Ok(detail) => detail,
        Err(e) => {
            warn!(error = %e, "Failed to fetch template {name} from old domain");
            return Outcome::FetchFailed;
        }
    };

    let template = NewTemplate::from_detail(name, detail);
    if let Err(e) = api.create_template(&template).await {
        warn!(error = %e, "Failed to create template {name} in new domain");
        return Outcome::CreateFailed;
    }
    info!("Template {name} created in new domain");

    if operation == Operation::Copy {
        return Outcome::Copied;
    }

    match api.delete_template(name).await {
        Ok(()) => {
            info!("Template {name} deleted from old domain");
            Outcome::Moved
        }
        Err(e) => {
            warn!(error = %e, "Failed to delete template {name} from old domain");
            Outcome::DeleteFailed
        }
    }
}

pub async fn migrate(config: &Config, operation: Operation) -> anyhow::Result<()> {
    let client = MailgunClient::new(config)?;
    run_migration(&client, config, operation).await;
    Ok(())
}
