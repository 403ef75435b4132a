use actix_web::{error::InternalError, HttpResponse};
use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidationErrors;

/// Body of every client-visible error
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

impl ErrorResponse {
    /// `{"error": error, "fields": {"message": message}}`
    pub fn message(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            fields: serde_json::json!({ "message": message.into() }),
        }
    }
}

/// Per-field messages, falling back to a generic one when the rule has none.
pub fn field_messages(errors: &ValidationErrors) -> serde_json::Map<String, serde_json::Value> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation error in field: {}", field))
                })
                .collect();
            (field.to_string(), serde_json::json!({ "errors": messages }))
        })
        .collect()
}

/// Optional text field, trimmed, where a blank value counts as absent.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

fn bad_request(body: ErrorResponse) -> actix_web::Error {
    InternalError::from_response("", HttpResponse::BadRequest().json(body)).into()
}

/// JSON extractor config shared by every endpoint that takes a body
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| match err {
        actix_web_validator::Error::Validate(validation_errors) => bad_request(ErrorResponse {
            error: "Validation failed".to_string(),
            fields: serde_json::Value::Object(field_messages(&validation_errors)),
        }),
        actix_web_validator::Error::Deserialize(de_err) => {
            let err_string = de_err.to_string();
            let message = if err_string.contains("EOF while parsing") {
                "Request body is empty. Expected JSON payload"
            } else if err_string.contains("unknown variant") {
                "Invalid enum value. Check allowed values for this field"
            } else {
                "Invalid JSON format"
            };
            bad_request(ErrorResponse::message("Request validation failed", message))
        }
        _ => bad_request(ErrorResponse::message("Validation failed", "Validation error")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::job::models::CityChange;
    use actix_web::{test, web, App, HttpResponse};
    use actix_web_validator::Json;

    async fn echo_city(body: Json<CityChange>) -> HttpResponse {
        HttpResponse::Ok().body(body.into_inner().city)
    }

    #[actix_web::test]
    async fn empty_city_reports_field_message() {
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .route("/city", web::patch().to(echo_city)),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/city")
            .set_json(serde_json::json!({ "city": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(
            body["fields"]["city"]["errors"][0],
            "city is required in request body"
        );
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(json_config())
                .route("/city", web::patch().to(echo_city)),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/city")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"city\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
