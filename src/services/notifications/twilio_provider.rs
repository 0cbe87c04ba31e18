//! Twilio SMS provider.
//!
//! `POST {api_base_url}/2010-04-01/Accounts/{sid}/Messages.json` with basic
//! auth and a form body. Sender is `MessagingServiceSid` when configured,
//! otherwise `From`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{ProviderError, ProviderReceipt, SmsMessage, SmsProvider};
use crate::config::TwilioConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sender {
    MessagingService(String),
    PhoneNumber(String),
}

pub struct TwilioProvider {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    sender: Sender,
    messages_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

impl TwilioProvider {
    /// Build from config; `None` when credentials or sender are missing.
    pub fn from_config(config: &TwilioConfig) -> Result<Option<Self>, ProviderError> {
        let (Some(account_sid), Some(auth_token)) = (
            non_blank(&config.account_sid),
            non_blank(&config.auth_token),
        ) else {
            return Ok(None);
        };

        let sender = match (
            non_blank(&config.messaging_service_sid),
            non_blank(&config.phone_number),
        ) {
            (Some(service), _) => Sender::MessagingService(service),
            (None, Some(number)) => Sender::PhoneNumber(number),
            (None, None) => return Ok(None),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("tlc-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base_url.trim_end_matches('/'),
            account_sid
        );

        Ok(Some(Self {
            client,
            account_sid,
            auth_token,
            sender,
            messages_url,
        }))
    }

    fn form_fields<'a>(&'a self, message: &'a SmsMessage) -> Vec<(&'static str, &'a str)> {
        let sender = match &self.sender {
            Sender::MessagingService(sid) => ("MessagingServiceSid", sid.as_str()),
            Sender::PhoneNumber(number) => ("From", number.as_str()),
        };
        vec![
            ("To", message.to.as_str()),
            ("Body", message.body.as_str()),
            sender,
        ]
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn rejection(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<TwilioErrorBody>(body) {
        Ok(parsed) => ProviderError::Rejected {
            status,
            code: parsed.code,
            message: parsed.message.unwrap_or_else(|| "no message".to_string()),
        },
        Err(_) => ProviderError::Rejected {
            status,
            code: None,
            message: body.chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl SmsProvider for TwilioProvider {
    async fn send(&self, message: &SmsMessage) -> Result<ProviderReceipt, ProviderError> {
        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.form_fields(message))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            let error = rejection(status.as_u16(), &body);
            tracing::warn!(error = %error, "Twilio rejected message");
            return Err(error);
        }

        let resource: MessageResource = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(ProviderReceipt {
            message_id: resource.sid,
            status: resource.status,
        })
    }

    fn name(&self) -> &'static str {
        "twilio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Form, Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(String, HashMap<String, String>, bool)>>>;

    async fn fake_messages(
        State(captured): State<Captured>,
        Path(sid): Path<String>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let has_auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Basic "));
        let invalid = form.get("To").is_some_and(|to| to == "+10000000000");
        captured.lock().unwrap().push((sid, form, has_auth));

        if invalid {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"code": 21211, "message": "Invalid 'To' Phone Number", "status": 400})),
            );
        }
        (
            StatusCode::CREATED,
            Json(json!({"sid": "SM0123456789abcdef", "status": "queued"})),
        )
    }

    async fn spawn_fake_twilio() -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/{sid}/Messages.json",
                post(fake_messages),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), captured)
    }

    fn config(base_url: &str) -> TwilioConfig {
        TwilioConfig {
            account_sid: Some("AC123".to_string()),
            auth_token: Some("secret".to_string()),
            phone_number: Some("+15550000000".to_string()),
            api_base_url: base_url.to_string(),
            ..TwilioConfig::default()
        }
    }

    fn message(to: &str) -> SmsMessage {
        SmsMessage {
            to: to.to_string(),
            body: "Hi Sam!".to_string(),
        }
    }

    #[test]
    fn test_unconfigured_provider_is_none() {
        assert!(TwilioProvider::from_config(&TwilioConfig::default())
            .unwrap()
            .is_none());

        let no_sender = TwilioConfig {
            phone_number: None,
            ..config("https://api.twilio.com")
        };
        assert!(TwilioProvider::from_config(&no_sender).unwrap().is_none());
    }

    #[test]
    fn test_messaging_service_wins_over_phone_number() {
        let both = TwilioConfig {
            messaging_service_sid: Some("MG42".to_string()),
            ..config("https://api.twilio.com/")
        };
        let provider = TwilioProvider::from_config(&both).unwrap().unwrap();
        let msg = message("+15551234567");
        let fields = provider.form_fields(&msg);

        assert!(fields.contains(&("MessagingServiceSid", "MG42")));
        assert!(!fields.iter().any(|(k, _)| *k == "From"));
        assert_eq!(
            provider.messages_url,
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_rejection_parsing() {
        match rejection(400, r#"{"code": 21608, "message": "Unverified number"}"#) {
            ProviderError::Rejected { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(21608));
                assert_eq!(message, "Unverified number");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }

        assert!(matches!(
            rejection(503, "<html>down</html>"),
            ProviderError::Rejected { code: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_send_posts_form_with_basic_auth() {
        let (base_url, captured) = spawn_fake_twilio().await;
        let provider = TwilioProvider::from_config(&config(&base_url))
            .unwrap()
            .unwrap();

        let receipt = provider.send(&message("+15551234567")).await.unwrap();
        assert_eq!(receipt.message_id, "SM0123456789abcdef");
        assert_eq!(receipt.status.as_deref(), Some("queued"));

        let captured = captured.lock().unwrap();
        let (sid, form, has_auth) = &captured[0];
        assert_eq!(sid, "AC123");
        assert!(has_auth);
        assert_eq!(form.get("To").map(String::as_str), Some("+15551234567"));
        assert_eq!(form.get("From").map(String::as_str), Some("+15550000000"));
        assert_eq!(form.get("Body").map(String::as_str), Some("Hi Sam!"));
    }

    #[tokio::test]
    async fn test_send_surfaces_provider_rejection() {
        let (base_url, _) = spawn_fake_twilio().await;
        let provider = TwilioProvider::from_config(&config(&base_url))
            .unwrap()
            .unwrap();

        let err = provider.send(&message("+10000000000")).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Rejected {
                status: 400,
                code: Some(21211),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let provider = TwilioProvider::from_config(&config("http://127.0.0.1:9"))
            .unwrap()
            .unwrap();
        let err = provider.send(&message("+15551234567")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
