use anyhow::Result;
use clap::{Parser, Subcommand};
use docqa_client::{DispatchConfig, Dispatcher, FileSelection, TerminalPage, DEFAULT_SERVER_URL};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "docqa", about = "Ask questions about three PDF files")]
struct Cli {
    /// Base URL of the question-answering server
    #[arg(long, env = "DOCQA_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    server: String,

    /// Only send the question; do not upload the selected files
    #[arg(long, global = true)]
    no_upload: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a single question
    Ask {
        /// A PDF to upload; pass exactly three
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        #[arg(default_value = "")]
        query: String,
    },
    /// Read questions from stdin, one per line
    Repl {
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut dispatcher = Dispatcher::new(DispatchConfig {
        base_url: cli.server,
        upload_files: !cli.no_upload,
    });
    let mut page = TerminalPage::stdio();

    match cli.command {
        Command::Ask { files, query } => {
            let selection = FileSelection::from_paths(&files);
            let outcome = dispatcher.dispatch(&query, &selection, &mut page).await;
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Repl { files } => {
            let selection = FileSelection::from_paths(&files);
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            while let Some(line) = lines.next_line().await? {
                let outcome = dispatcher.dispatch(&line, &selection, &mut page).await;
                // The server keeps its index, so later questions skip the upload.
                if outcome.is_success() && dispatcher.config().upload_files {
                    dispatcher.set_upload_files(false);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
