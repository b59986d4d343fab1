//! The `guuk quizzes` and `guuk take` commands.

use std::path::Path;

use anyhow::{bail, Result};
use comfy_table::{Cell, Table};

use guuk_core::catalog::QuizCatalog;
use guuk_core::quiz_session::QuizSession;

use super::{truncate, App};

pub async fn list(config_path: Option<&Path>) -> Result<()> {
    let app = App::load(config_path)?;
    let session = app.session()?;
    let quizzes = QuizCatalog::new(app.backend.clone()).list(session).await?;

    if quizzes.is_empty() {
        println!("No quizzes yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Questions", "By", "Created"]);
    for quiz in &quizzes {
        table.add_row(vec![
            Cell::new(&quiz.id),
            Cell::new(truncate(&quiz.title, 40)),
            Cell::new(quiz.question_count()),
            Cell::new(&quiz.created_by),
            Cell::new(
                quiz.created_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn take(config_path: Option<&Path>, quiz_id: String, answers: Option<String>) -> Result<()> {
    let app = App::load(config_path)?;
    let session = app.session()?;

    let mut attempt = QuizSession::new(app.backend.clone());
    let quiz = attempt.load(session, &quiz_id).await?;

    let Some(answers) = answers else {
        println!("{}", quiz.title);
        for (i, question) in quiz.questions.iter().enumerate() {
            println!("\n{}. {}", i + 1, question.text);
            for (j, option) in question.options.iter().enumerate() {
                println!("   {}) {option}", j + 1);
            }
        }
        println!("\nAnswer with: guuk take {quiz_id} --answers 1,2,...");
        return Ok(());
    };

    let question_count = quiz.questions.len();
    let choices = parse_answers(&answers)?;
    if choices.len() > question_count {
        bail!(
            "{} answers given but the quiz has {question_count} questions",
            choices.len()
        );
    }
    for (question, choice) in choices.into_iter().enumerate() {
        if let Some(option) = choice {
            attempt.set_answer(question, option)?;
        }
    }

    let score = attempt.submit(session).await?;
    println!("Score: {}/{}", score.score, score.total);

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer"]);
    for (i, item) in attempt.review()?.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(truncate(&item.question, 50)),
            Cell::new(&item.chosen),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Parse `"2,1,-"` into zero-based option indices; `-` or an empty slot
/// leaves that question unanswered.
fn parse_answers(raw: &str) -> Result<Vec<Option<usize>>> {
    raw.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, token)| match token {
            "" | "-" => Ok(None),
            n => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Some(n - 1)),
                _ => bail!("answer {} must be an option number from 1, got '{n}'", i + 1),
            },
        })
        .collect()
}
