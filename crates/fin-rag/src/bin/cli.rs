//! Command-line front end for the QA server
//!
//! Run with: cargo run -p fin-rag --features cli --bin fin-rag -- ask "What was net profit?"

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fin_rag::types::{AnswerResponse, FileType, IngestResponse};

#[derive(Parser)]
#[command(name = "fin-rag", version, about = "Ask questions about financial documents")]
struct Cli {
    /// Base URL of the fin-rag server
    #[arg(long, env = "FIN_RAG_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a document from a URL and index it
    Fetch {
        /// Document URL
        url: String,
    },
    /// Upload a local PDF or DOCX and index it
    Upload {
        /// Path to the document
        path: PathBuf,
    },
    /// Ask a question about the indexed documents
    Ask {
        /// The question
        question: Vec<String>,
    },
    /// Prompt for documents and questions until `quit`
    Interactive,
}

/// Thin client for the server endpoints
struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder().build()?,
        })
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<IngestResponse> {
        let response = self
            .http
            .post(format!("{}/fetch_document/", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?;
        parse(response).await
    }

    async fn upload(&self, path: &Path) -> anyhow::Result<IngestResponse> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;

        if !FileType::from_filename(&filename).is_supported() {
            bail!("only PDF and DOCX files can be uploaded: {}", filename);
        }

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let form = reqwest::multipart::Form::new().part(
            "upload_file",
            reqwest::multipart::Part::bytes(data).file_name(filename),
        );

        let response = self
            .http
            .post(format!("{}/upload_document/", self.base_url))
            .multipart(form)
            .send()
            .await?;
        parse(response).await
    }

    async fn ask(&self, question: &str) -> anyhow::Result<AnswerResponse> {
        let response = self
            .http
            .get(format!("{}/submit/", self.base_url))
            .query(&[("question", question)])
            .send()
            .await?;
        parse(response).await
    }
}

/// Decode a success body, or turn the server's `detail` into an error
async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(anyhow!("{} ({})", detail, status))
}

async fn with_spinner<T>(message: &str, task: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = task.await;
    spinner.finish_and_clear();
    result
}

fn print_ingest(response: &IngestResponse) {
    println!("{} {}", style("✓").green().bold(), response.message);
    println!("  {}", style(&response.file_path).dim());
}

fn print_answer(response: &AnswerResponse) {
    println!("\n{}\n", response.result.trim());
}

fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", style("error:").red().bold(), err);
}

/// Run one request; interactive mode is driven from `main`
async fn run_request(client: &ApiClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Fetch { url } => {
            let response = with_spinner("Downloading and indexing...", client.fetch(&url)).await?;
            print_ingest(&response);
        }
        Command::Upload { path } => {
            let response = with_spinner("Uploading and indexing...", client.upload(&path)).await?;
            print_ingest(&response);
        }
        Command::Ask { question } => {
            let question = question.join(" ");
            if question.trim().is_empty() {
                bail!("question is empty");
            }
            let response = with_spinner("Thinking...", client.ask(&question)).await?;
            print_answer(&response);
        }
        Command::Interactive => bail!("already in interactive mode"),
    }
    Ok(())
}

async fn interactive(client: &ApiClient) -> anyhow::Result<()> {
    let term = Term::stdout();

    println!("{}", style("Financial Document Analyzer").cyan().bold());
    println!(
        "{}",
        style("Commands: fetch <url> | upload <path> | ask <question> | quit. Plain text is asked as a question.").dim()
    );

    loop {
        term.write_str(&format!("{} ", style(">").cyan()))?;
        let line = term.read_line()?;
        let line = line.trim();

        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match verb {
            "" => continue,
            "quit" | "exit" => break,
            "fetch" if !rest.is_empty() => Command::Fetch {
                url: rest.to_string(),
            },
            "upload" if !rest.is_empty() => Command::Upload {
                path: PathBuf::from(rest),
            },
            "ask" => Command::Ask {
                question: vec![rest.to_string()],
            },
            "fetch" | "upload" => {
                println!("{}", style(format!("usage: {} <target>", verb)).yellow());
                continue;
            }
            _ => Command::Ask {
                question: vec![line.to_string()],
            },
        };

        if let Err(e) = run_request(client, command).await {
            print_error(&e);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match (ApiClient::new(&cli.base_url), cli.command) {
        (Ok(client), Command::Interactive) => interactive(&client).await,
        (Ok(client), command) => run_request(&client, command).await,
        (Err(e), _) => Err(e),
    };

    if let Err(e) = result {
        print_error(&e);
        std::process::exit(1);
    }
}
