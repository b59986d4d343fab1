//! The `guuk validate-quiz` and `guuk create-quiz` commands.

use std::path::{Path, PathBuf};

use anyhow::Result;

use guuk_core::authoring::{QuizAuthoring, QuizDraft};

use super::App;

pub fn validate(file: PathBuf) -> Result<()> {
    let draft = QuizDraft::load(&file)?;
    draft.validate()?;
    println!(
        "Quiz draft '{}' is valid ({} questions)",
        draft.title.trim(),
        draft.questions.len()
    );
    Ok(())
}

pub async fn create(config_path: Option<&Path>, file: PathBuf) -> Result<()> {
    let draft = QuizDraft::load(&file)?;
    let app = App::load(config_path)?;
    let session = app.session()?;

    let mut authoring = QuizAuthoring::with_draft(app.backend.clone(), draft);
    let created = authoring.submit(session).await?;
    match created.quiz_id {
        Some(id) => println!("Created quiz '{}' ({id})", created.title),
        None => println!("Created quiz '{}'", created.title),
    }
    Ok(())
}
