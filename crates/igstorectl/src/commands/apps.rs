//! Apps command implementation.

use anyhow::Result;
use igstore::model::Application;
use igstore::Database;
use serde::Serialize;

use crate::OutputFormat;

#[derive(Serialize)]
struct AppsOutput {
    applications: Vec<Application>,
    total: usize,
}

pub async fn list(database: &Database, format: OutputFormat) -> Result<()> {
    let applications = database.applications().get_all().await?;
    let output = AppsOutput {
        total: applications.len(),
        applications,
    };

    match format {
        OutputFormat::Text => {
            if output.applications.is_empty() {
                println!("No applications found.");
            } else {
                println!("{:<24} {:<10} {:>8} {:>20}", "NAME", "STATUS", "REQ/MIN", "UPDATED");
                println!("{}", "-".repeat(65));
                for app in &output.applications {
                    println!(
                        "{:<24} {:<10} {:>8} {:>20}",
                        app.name,
                        format!("{:?}", app.status).to_lowercase(),
                        app.allowance.overall_requests,
                        app.updated.format(igstore::codec::DATE_FORMAT)
                    );
                }
                println!();
                println!("Total: {} application(s)", output.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
