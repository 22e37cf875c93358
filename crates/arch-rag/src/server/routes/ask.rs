//! Question endpoints: browser form and JSON API

use axum::{
    extract::{Multipart, State},
    response::Html,
    Json,
};

use crate::error::{Error, Result};
use crate::server::page;
use crate::server::state::AppState;
use crate::types::{AnswerPair, ImageUpload};

/// Fields of the question form
#[derive(Debug, Default)]
pub struct AskForm {
    /// `user_question`, trimmed; `None` when missing or blank
    pub question: Option<String>,
    /// `user_image`; `None` when no file was chosen
    pub image: Option<ImageUpload>,
}

/// Read `user_question` and `user_image` from a multipart body
pub async fn read_form(mut multipart: Multipart) -> Result<AskForm> {
    let mut form = AskForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "user_question" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidRequest(format!("Unreadable question: {}", e)))?;
                let text = text.trim();
                form.question = (!text.is_empty()).then(|| text.to_string());
            }
            "user_image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidRequest(format!("Unreadable image: {}", e)))?;

                // Browsers send an empty part when no file is chosen
                if !data.is_empty() {
                    form.image = Some(ImageUpload {
                        filename,
                        data: data.to_vec(),
                    });
                }
            }
            other => {
                tracing::debug!("Ignoring form field {:?}", other);
            }
        }
    }

    Ok(form)
}

/// GET / - empty form
pub async fn form() -> Html<String> {
    Html(page::form_page())
}

/// POST / - answer page; a blank question shows the empty form
pub async fn submit_form(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>> {
    let form = read_form(multipart).await?;

    let Some(question) = form.question else {
        return Ok(Html(page::form_page()));
    };

    let answer = state.pipeline().answer(&question, form.image).await?;
    Ok(Html(page::answer_page(&question, &answer)))
}

/// POST /api/ask - answer pair as JSON
pub async fn ask_json(State(state): State<AppState>, multipart: Multipart) -> Result<Json<AnswerPair>> {
    let form = read_form(multipart).await?;

    let question = form
        .question
        .ok_or_else(|| Error::InvalidRequest("user_question is required".to_string()))?;

    let answer = state.pipeline().answer(&question, form.image).await?;
    Ok(Json(answer))
}
