//! Authentication endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use guuk_core::traits::{AuthService, LoginResponse, RegisterRequest};
use guuk_core::ServiceError;

use crate::backend::HttpBackend;

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    status: String,
}

#[async_trait]
impl AuthService for HttpBackend {
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let request = self
            .post_request("/login", None)
            .json(&LoginBody { username, password });
        self.send_json(request).await
    }

    #[instrument(skip_all, fields(username = %request.username))]
    async fn register(&self, request: &RegisterRequest) -> Result<(), ServiceError> {
        let response: RegisterResponse = self
            .send_json(self.post_request("/register", None).json(request))
            .await?;
        if response.status == "registered" {
            Ok(())
        } else {
            Err(ServiceError::Rejected {
                status: 200,
                detail: Some(format!("registration not completed ({})", response.status)),
            })
        }
    }
}
