//! Terminal front-end for the CV upload wizard.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use reqwest::Client;
use resumatch_backend::{
    client::{backend::BackendClient, query_cache::QueryCache},
    models::cv_data::CvData,
    wizard::{
        controller::UploadWizard,
        file::SelectedFile,
        machine::{Notice, Step},
    },
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "upload-cv", about = "Upload a CV and search for matching jobs")]
struct Args {
    /// PDF or DOCX file to upload.
    file: PathBuf,

    #[arg(long)]
    user_id: String,

    #[arg(long, env = "BACKEND_URL")]
    backend_url: String,

    /// Search without asking for confirmation.
    #[arg(long)]
    yes: bool,

    #[arg(long)]
    role: Option<String>,

    #[arg(long)]
    location: Option<String>,

    /// Comma-separated, replaces the extracted skills.
    #[arg(long, value_delimiter = ',')]
    skills: Option<Vec<String>>,

    #[arg(long)]
    years_experience: Option<i32>,

    #[arg(long)]
    summary: Option<String>,
}

impl Args {
    fn has_edits(&self) -> bool {
        self.role.is_some()
            || self.location.is_some()
            || self.skills.is_some()
            || self.years_experience.is_some()
            || self.summary.is_some()
    }

    fn apply(&self, cv: &CvData) -> CvData {
        CvData {
            role: self.role.clone().unwrap_or_else(|| cv.role.clone()),
            years_experience: self.years_experience.or(cv.years_experience),
            location: self.location.clone().unwrap_or_else(|| cv.location.clone()),
            skills: self.skills.clone().unwrap_or_else(|| cv.skills.clone()),
            summary: self.summary.clone().unwrap_or_else(|| cv.summary.clone()),
        }
    }
}

fn print_notices(wizard: &mut UploadWizard) {
    for Notice { message, action, .. } in wizard.take_notices() {
        match action {
            Some(action) => println!("{} ({}: {})", message, action.label, action.route.path()),
            None => println!("{}", message),
        }
    }
}

fn fail_on_alerts(wizard: &mut UploadWizard) -> anyhow::Result<()> {
    let alerts = wizard.take_alerts();
    if let Some(first) = alerts.first() {
        bail!("{}", first);
    }
    Ok(())
}

fn print_cv(cv: &CvData) {
    println!("Role:             {}", cv.role);
    println!(
        "Years experience: {}",
        cv.years_experience.map(|y| y.to_string()).unwrap_or_default()
    );
    println!("Location:         {}", cv.location);
    println!("Skills:           {}", cv.skills.join(", "));
    println!("Summary:          {}", cv.summary);
}

fn confirm_prompt() -> anyhow::Result<bool> {
    print!("Search for matching jobs with this data? [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let file = SelectedFile::from_path(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let http = Client::builder().timeout(Duration::from_secs(120)).build()?;
    let backend = Arc::new(BackendClient::new(http, args.backend_url.clone()));
    let mut wizard = UploadWizard::new(args.user_id.clone(), backend, QueryCache::default());

    println!("{}", wizard.state().step.title());
    wizard.choose_file(file).await;
    fail_on_alerts(&mut wizard)?;

    println!("Uploading {}...", args.file.display());
    wizard.upload().await;
    print_notices(&mut wizard);
    if wizard.state().step != Step::DataReview {
        bail!("CV could not be analyzed");
    }

    if args.has_edits() {
        if let Some(cv) = wizard.state().cv_data.clone() {
            wizard.edit(args.apply(&cv)).await;
            fail_on_alerts(&mut wizard)?;
        }
    }

    println!("{}", wizard.state().step.title());
    if let Some(cv) = &wizard.state().cv_data {
        print_cv(cv);
    }

    if !args.yes && !confirm_prompt()? {
        println!("Aborted.");
        return Ok(());
    }

    wizard.confirm().await;
    fail_on_alerts(&mut wizard)?;
    print_notices(&mut wizard);
    if wizard.state().step != Step::Redirecting {
        bail!("job search failed");
    }

    if let Some(route) = wizard.wait_for_navigation().await {
        println!("Reports are ready at {}", route.path());
    }
    Ok(())
}
