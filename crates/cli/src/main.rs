use clap::{Parser, Subcommand};
use mailer_models::{EmailRequest, TemplateData};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mailer-cli")]
#[command(about = "CLI tool for Mailer Service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value = "http://localhost:3000")]
    endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service is up
    Health,
    /// Queue an email for delivery
    Send(SendArgs),
    /// Show a page of the email log
    Status {
        /// Page number, 1-indexed
        #[arg(long, default_value = "1")]
        page: i64,
        /// Only show emails with this status (pending, sent, failed)
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(clap::Args)]
struct SendArgs {
    #[arg(long)]
    sender_email: String,
    #[arg(long)]
    sender_name: String,
    #[arg(long)]
    receiver_email: String,
    #[arg(long)]
    receiver_name: String,
    #[arg(long)]
    subject: String,
    /// HTML body
    #[arg(long, default_value = "")]
    content: String,
    /// Plain-text alternative
    #[arg(long)]
    text: Option<String>,
    /// Render an embedded template instead of sending `content`
    #[arg(long)]
    template: Option<String>,
    #[arg(long)]
    company_name: Option<String>,
    #[arg(long)]
    login_url: Option<String>,
    #[arg(long)]
    support_url: Option<String>,
}

impl SendArgs {
    fn into_request(self) -> EmailRequest {
        let template_data = if self.company_name.is_some() || self.login_url.is_some() || self.support_url.is_some() {
            Some(TemplateData {
                company_name: self.company_name,
                login_url: self.login_url,
                support_url: self.support_url,
                year: None,
            })
        } else {
            None
        };

        EmailRequest {
            sender_email: self.sender_email,
            sender_name: self.sender_name,
            receiver_email: self.receiver_email,
            receiver_name: self.receiver_name,
            subject: self.subject,
            content: self.content,
            text: self.text,
            template: self.template,
            template_data,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Health => health(&client, &cli.endpoint).await?,
        Commands::Send(args) => send_email(&client, &cli.endpoint, args.into_request()).await?,
        Commands::Status { page, status } => email_status(&client, &cli.endpoint, page, status).await?,
    }

    Ok(())
}

async fn health(client: &Client, endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = client.get(format!("{endpoint}/health")).send().await?;
    print_json(response, "Health check").await
}

async fn send_email(client: &Client, endpoint: &str, request: EmailRequest) -> Result<(), Box<dyn std::error::Error>> {
    info!("Sending email to {}", request.receiver_email);

    let response = client.post(format!("{endpoint}/send-email")).json(&request).send().await?;
    print_json(response, "Send email").await
}

async fn email_status(
    client: &Client,
    endpoint: &str,
    page: i64,
    status: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut query = vec![("page", page.to_string())];
    if let Some(status) = status {
        query.push(("status", status));
    }

    let response = client.get(format!("{endpoint}/api/status")).query(&query).send().await?;
    print_json(response, "Get status").await
}

async fn print_json(response: Response, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if response.status().is_success() {
        let body: Value = response.json().await?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    } else {
        let error_text = response.text().await?;
        error!("{} failed: {}", what, error_text);
        Err(error_text.into())
    }
}
