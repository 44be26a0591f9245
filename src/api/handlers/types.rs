//! Request bodies for the auth relay endpoints.

use crate::identity::ResendType;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
pub struct UserRegister {
    pub email: String,
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct UserLogin {
    pub email: String,
    #[schema(value_type = String, format = Password)]
    pub password: SecretString,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ResendConfirmation {
    #[serde(rename = "type")]
    pub kind: ResendType,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub options: Option<Map<String, Value>>,
}
