// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Typed calls to the authentication endpoints.

use std::{borrow::Cow, sync::Arc};

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Serialize, Serializer};
use validator::{Validate, ValidationError};

use crate::{
    error::{self, Result},
    http::{Client, Request, Response},
};

pub const SIGN_IN_PATH: &str = "/auth/sign";
pub const SESSION_INFO_PATH: &str = "/session/info";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REGISTER_PATH: &str = "/auth/company/register";

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn password_length(password: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret().chars().count() >= MIN_PASSWORD_LENGTH {
        return Ok(());
    }
    let mut error = ValidationError::new("length");
    error.message = Some(Cow::from(format!(
        "Password must be at least {MIN_PASSWORD_LENGTH} characters"
    )));
    error.add_param(Cow::from("min"), &MIN_PASSWORD_LENGTH);
    Err(error)
}

fn password_present(password: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret().is_empty() {
        let mut error = ValidationError::new("length");
        error.message = Some(Cow::from("Password is required"));
        return Err(error);
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(serialize_with = "expose")]
    #[validate(custom(function = "password_present"))]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch: String,
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    #[validate(length(min = 1, message = "Contact number is required"))]
    pub contact_no: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    pub from_invitation: bool,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(serialize_with = "expose")]
    #[validate(custom(function = "password_length"))]
    pub password: SecretString,
    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,
}

/// Accepts an empty body or any JSON object; the endpoints that use this
/// carry no data the client relies on.
pub fn expect_object_or_empty(resp: &Response) -> Result<()> {
    if resp.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    match resp.json::<serde_json::Value>()? {
        serde_json::Value::Object(_) | serde_json::Value::Null => Ok(()),
        serde_json::Value::Array(_) => Err(error::Validation::NotAnObject("an array").into()),
        serde_json::Value::String(_) => Err(error::Validation::NotAnObject("a string").into()),
        serde_json::Value::Number(_) => Err(error::Validation::NotAnObject("a number").into()),
        serde_json::Value::Bool(_) => Err(error::Validation::NotAnObject("a boolean").into()),
    }
}

#[derive(Clone)]
pub struct AuthApi {
    client: Arc<Client>,
}

impl AuthApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn sign_in(&self, payload: &LoginPayload) -> Result<Response> {
        self.client
            .send(Request::post(SIGN_IN_PATH).json(payload)?)
            .await
    }

    pub async fn session_info(&self) -> Result<Response> {
        self.client.send(Request::get(SESSION_INFO_PATH)).await
    }

    pub async fn logout(&self) -> Result<()> {
        _ = self.client.send(Request::post(LOGOUT_PATH)).await?;
        Ok(())
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<()> {
        let resp = self
            .client
            .send(Request::post(REGISTER_PATH).json(payload)?)
            .await?;
        expect_object_or_empty(&resp)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    fn registration() -> RegisterPayload {
        RegisterPayload {
            address: "1 Main Street".to_owned(),
            branch: "HQ".to_owned(),
            company_name: "Example Events".to_owned(),
            contact_no: "+1 555 0100".to_owned(),
            email: "owner@example.com".to_owned(),
            first_name: "A".to_owned(),
            from_invitation: false,
            last_name: "Organizer".to_owned(),
            logo_path: None,
            password: SecretString::new("hunter22".to_owned()),
            position: "Owner".to_owned(),
        }
    }

    #[test]
    fn login_payload_wire_format() {
        let payload = LoginPayload {
            email: "a@example.com".to_owned(),
            password: SecretString::new("secret".to_owned()),
            admin: Some(true),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "email": "a@example.com", "password": "secret", "admin": true })
        );
        assert!(!format!("{payload:?}").contains("secret\""));
    }

    #[test]
    fn login_payload_requires_credentials() {
        let payload = LoginPayload {
            email: String::new(),
            password: SecretString::new(String::new()),
            admin: None,
        };
        let err = error::Validation::from(payload.validate().unwrap_err());
        assert!(err.concerns("email"));
        assert!(err.concerns("password"));
        assert!(!err.concerns_only("email"));
    }

    #[test]
    fn registration_wire_format() {
        let value = serde_json::to_value(registration()).unwrap();
        assert_eq!(value["companyName"], "Example Events");
        assert_eq!(value["fromInvitation"], false);
        assert_eq!(value["password"], "hunter22");
        assert!(value.get("logoPath").is_none());
    }

    #[test]
    fn registration_validation() {
        assert!(registration().validate().is_ok());

        let mut short = registration();
        short.password = SecretString::new("12345".to_owned());
        let err = error::Validation::from(short.validate().unwrap_err());
        assert!(err.concerns_only("password"));
        assert!(err.to_string().contains("at least 6 characters"));

        let mut bad_email = registration();
        bad_email.email = "owner".to_owned();
        let err = error::Validation::from(bad_email.validate().unwrap_err());
        assert!(err.concerns_only("email"));

        let mut no_branch = registration();
        no_branch.branch = String::new();
        let err = error::Validation::from(no_branch.validate().unwrap_err());
        assert!(err.concerns_only("branch"));

        let mut many = registration();
        many.position = String::new();
        many.password = SecretString::new("123".to_owned());
        let err = error::Validation::from(many.validate().unwrap_err());
        assert!(err.concerns("position"));
        assert!(!err.concerns_only("password"));
    }

    #[test]
    fn object_or_empty_bodies() {
        assert!(expect_object_or_empty(&Response::new(200)).is_ok());
        assert!(expect_object_or_empty(&Response::new(200).with_json(&json!({}))).is_ok());
        assert!(
            expect_object_or_empty(&Response::new(200).with_json(&json!({ "ok": true }))).is_ok()
        );
        assert!(matches!(
            expect_object_or_empty(&Response::new(200).with_json(&json!([1]))),
            Err(Error::Validation(error::Validation::NotAnObject(_)))
        ));
    }
}
