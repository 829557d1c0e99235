use super::MessageBody;

use axum::routing::get;
use axum::Json;

/// Posts are not served yet, only the liveness probe.
pub fn router() -> axum::Router {
    axum::Router::new().route("/test", get(test))
}

async fn test() -> Json<MessageBody> {
    Json(MessageBody {
        msg: "Posts Works".to_string(),
    })
}
