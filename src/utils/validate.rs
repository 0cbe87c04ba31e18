use crate::error::{AppError, AppResult};
use axum::extract::{FromRequest, FromRequestParts, Json, Query, Request};
use axum::extract::rejection::JsonRejection;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that passed `validator` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string that passed `validator` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Reminder {
        #[validate(length(min = 1, max = 20, message = "name must be 1-20 characters"))]
        name: String,
        #[validate(range(min = 1, message = "interval must be positive"))]
        interval: i64,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json() {
        let request = json_request(r#"{"name": "Sam", "interval": 28}"#);
        let ValidatedJson(reminder) = ValidatedJson::<Reminder>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(reminder.name, "Sam");
        assert_eq!(reminder.interval, 28);
    }

    #[tokio::test]
    async fn test_rule_violation_is_validation_error() {
        let request = json_request(r#"{"name": "", "interval": 0}"#);
        let error = ValidatedJson::<Reminder>::from_request(request, &())
            .await
            .unwrap_err();

        match error {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "interval");
                assert_eq!(reason, "interval must be positive");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request(r#"{"name": "Sam""#);
        let error = ValidatedJson::<Reminder>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .body(Body::from(r#"{"name": "Sam", "interval": 28}"#))
            .unwrap();
        let error = ValidatedJson::<Reminder>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_query_extraction() {
        let request = Request::builder()
            .uri("/test?name=Alex&interval=30")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let ValidatedQuery(reminder) = ValidatedQuery::<Reminder>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(reminder.name, "Alex");
    }
}
