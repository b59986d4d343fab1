//! The `guuk init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("guuk.toml").exists() {
        println!("guuk.toml already exists, skipping.");
    } else {
        std::fs::write("guuk.toml", SAMPLE_CONFIG)?;
        println!("Created guuk.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit guuk.toml to point at your guuk API");
    println!("  2. Run: guuk login <username>");
    println!("  3. Run: guuk validate-quiz quizzes/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# guuk configuration

api_base_url = "http://localhost:8000"
timeout_secs = 60

# Users allowed to publish quizzes
admin_users = ["admin"]

# openai, gemini, claude or manus
default_provider = "openai"
"#;

const EXAMPLE_QUIZ: &str = r#"title = "Warm-up"

[[questions]]
text = "2 + 2 = ?"
options = ["3", "4", "5", "6"]
answer = 1

[[questions]]
text = "Which planet is known as the red planet?"
options = ["Venus", "Mars", "Jupiter"]
answer = 1
"#;
