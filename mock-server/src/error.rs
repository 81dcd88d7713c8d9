//! Error responses shaped like the real backend's: `{"detail": "..."}` for
//! domain errors and `{"detail": [{loc, msg, type}, ...]}` for validation.

use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

#[derive(Debug)]
pub enum ApiErr {
    Detail(StatusCode, String),
    Validation(Vec<Value>),
}

impl ApiErr {
    pub fn new(status: StatusCode, detail: &str) -> Self {
        ApiErr::Detail(status, detail.to_string())
    }

    pub fn field(loc: &[&str], msg: &str, kind: &str) -> Self {
        ApiErr::Validation(vec![json!({"loc": loc, "msg": msg, "type": kind})])
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        match self {
            ApiErr::Detail(status, detail) => {
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            ApiErr::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": errors })),
            )
                .into_response(),
        }
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        ApiErr::field(&["body"], &rejection.body_text(), "json_invalid")
    }
}

impl From<FormRejection> for ApiErr {
    fn from(rejection: FormRejection) -> Self {
        ApiErr::field(&["body"], &rejection.body_text(), "missing")
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        ApiErr::field(&["query"], &rejection.body_text(), "int_parsing")
    }
}

impl From<PathRejection> for ApiErr {
    fn from(rejection: PathRejection) -> Self {
        ApiErr::field(&["path", "user_id"], &rejection.body_text(), "uuid_parsing")
    }
}
