//! The `guuk register`, `login`, `logout` and `whoami` commands.

use std::path::Path;

use anyhow::Result;

use guuk_core::session::Capability;
use guuk_core::traits::{AuthService, RegisterRequest};

use super::{resolve_password, App};
use crate::session_store;

pub async fn register(
    config_path: Option<&Path>,
    username: String,
    password: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let app = App::load(config_path)?;
    let request = RegisterRequest {
        username,
        password: resolve_password(password)?,
        email,
    };
    app.backend
        .register(&request)
        .await
        .map_err(guuk_core::CoreError::from)?;
    println!("Registered {}. Run `guuk login {}` to sign in.", request.username, request.username);
    Ok(())
}

pub async fn login(
    config_path: Option<&Path>,
    username: String,
    password: Option<String>,
) -> Result<()> {
    let mut app = App::load(config_path)?;
    let password = resolve_password(password)?;
    let policy = app.config.role_policy();

    let session = app
        .context
        .sign_in(&*app.backend, &username, &password, &policy)
        .await?;
    session_store::save(&app.config.session_file, session)?;

    let role = if session.can(Capability::AuthorQuizzes) {
        " (quiz author)"
    } else {
        ""
    };
    println!("Signed in as {}{role}", session.username());
    Ok(())
}

pub fn logout(config_path: Option<&Path>) -> Result<()> {
    let mut app = App::load(config_path)?;
    app.context.clear();
    if session_store::clear(&app.config.session_file)? {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub fn whoami(config_path: Option<&Path>) -> Result<()> {
    let app = App::load(config_path)?;
    let session = app.session()?;
    let capabilities: Vec<String> = session
        .capabilities()
        .iter()
        .map(|c| format!("{c:?}"))
        .collect();
    println!("{}", session.username());
    println!("  can: {}", capabilities.join(", "));
    println!("  api: {}", app.backend.base_url());
    Ok(())
}
