//! guuk CLI: quizzes, AI content generation and history from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use guuk_core::model::ContentType;
use guuk_core::provider::Provider;

mod commands;
mod session_store;

#[derive(Parser)]
#[command(name = "guuk", version, about = "Quizzes and AI content generation")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and example quiz draft
    Init,

    /// Create an account
    Register {
        username: String,

        /// Password (falls back to GUUK_PASSWORD)
        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Sign in and remember the session
    Login {
        username: String,

        /// Password (falls back to GUUK_PASSWORD)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the remembered session
    Logout,

    /// Show the signed-in user and what they may do
    Whoami,

    /// List available quizzes
    Quizzes,

    /// Show a quiz, or answer it with --answers
    Take {
        quiz_id: String,

        /// Option numbers per question, 1-based (e.g. "2,1,3"); "-" skips one
        #[arg(long)]
        answers: Option<String>,
    },

    /// Check a quiz draft TOML file
    ValidateQuiz {
        /// Path to the draft
        file: PathBuf,
    },

    /// Publish a quiz draft TOML file
    CreateQuiz {
        /// Path to the draft
        file: PathBuf,
    },

    /// Generate content
    Generate {
        /// text, image, video, animation or voiceover
        content_type: ContentType,

        prompt: String,

        /// openai, gemini, claude or manus (default from config)
        #[arg(long)]
        provider: Option<Provider>,

        /// Provider model (default from the model catalog)
        #[arg(long)]
        model: Option<String>,
    },

    /// Show history grouped by kind
    History {
        /// Only show one kind (e.g. image)
        #[arg(long)]
        kind: Option<String>,

        /// Also export the history as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show scored quiz attempts
    Results,

    /// Download the media of a history entry
    Download {
        /// Entry number as shown by `guuk history`
        index: usize,

        /// Target directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// List known models
    Models {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<Provider>,
    },
}

#[tokio::main]
async fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "guuk=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Register {
            username,
            password,
            email,
        } => commands::auth::register(config, username, password, email).await,
        Commands::Login { username, password } => {
            commands::auth::login(config, username, password).await
        }
        Commands::Logout => commands::auth::logout(config),
        Commands::Whoami => commands::auth::whoami(config),
        Commands::Quizzes => commands::quizzes::list(config).await,
        Commands::Take { quiz_id, answers } => {
            commands::quizzes::take(config, quiz_id, answers).await
        }
        Commands::ValidateQuiz { file } => commands::author::validate(file),
        Commands::CreateQuiz { file } => commands::author::create(config, file).await,
        Commands::Generate {
            content_type,
            prompt,
            provider,
            model,
        } => commands::generate::execute(config, content_type, prompt, provider, model).await,
        Commands::History { kind, json } => commands::history::show(config, kind, json).await,
        Commands::Results => commands::history::results(config).await,
        Commands::Download { index, dir } => commands::history::download(config, index, dir).await,
        Commands::Models { provider } => commands::models::execute(provider),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
