use axum::Form;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::DeskError;
use crate::service::controller::View;

/// Form extractor whose rejections use the JSON error body.
pub type DeskForm<T> = WithRejection<Form<T>, DeskError>;

/// Body of every roster response: the screen to draw, plus whatever the
/// last button produced.
#[derive(Debug, Serialize)]
pub struct Rendered<T: Serialize = ()> {
    pub view: View,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl Rendered<()> {
    pub fn view(view: View) -> Self {
        Self {
            view,
            message: None,
            data: None,
        }
    }
}

impl<T: Serialize> Rendered<T> {
    pub fn with(view: View, message: impl Into<String>, data: T) -> Self {
        Self {
            view,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// `group` stays text here; it is validated by `NewStudent::parse`.
#[derive(Debug, Deserialize)]
pub struct StudentForm {
    pub first_name: String,
    pub last_name: String,
    pub group: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadForm {
    pub key: String,
    pub value: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub confidential: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub value: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub confidential: bool,
}

/// HTML checkboxes submit `on`; API clients tend to send `true`.
fn checkbox<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(d)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "" | "off" | "false" | "0" | "no" => Ok(false),
        other => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"a checkbox value such as `on` or `true`",
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct ValueBody {
    pub key: String,
    pub value: String,
}

