use utoipa::OpenApi;

pub const HEALTH_TAG: &str = "Health";
pub const NOTIFICATION_TAG: &str = "Notifications";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tlc-gateway",
        description = "Validated, rate-limited outbound SMS reminders",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
        )
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = NOTIFICATION_TAG, description = "Reminder dispatch and quota endpoints"),
    )
)]
pub struct ApiDoc;
