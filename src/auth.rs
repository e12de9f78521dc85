use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::http::{join, post_json_any_status};

/// Whatever the account service tells us about the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Deserialize)]
struct AuthReply {
    success: bool,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    message: Option<String>,
}

fn rejected(reply: AuthReply, fallback: &str) -> ServiceError {
    ServiceError::Rejected(reply.message.unwrap_or_else(|| fallback.to_string()))
}

fn parse_reply(body: Value) -> Result<AuthReply> {
    serde_json::from_value(body).map_err(|e| ServiceError::MalformedResponse(format!("auth reply: {e}")))
}

pub struct AuthService {
    agent: ureq::Agent,
    base_url: String,
}

impl AuthService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.into(),
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        let url = join(&self.base_url, "auth/login");
        let body = post_json_any_status(
            &self.agent,
            &url,
            &Credentials {
                username,
                password,
                email: None,
            },
        )?;
        let reply = parse_reply(body)?;
        match reply {
            AuthReply {
                success: true,
                user: Some(user),
                ..
            } => {
                info!(%username, "logged in");
                Ok(user)
            }
            other => Err(rejected(other, "Invalid username or password")),
        }
    }

    pub fn signup(&self, username: &str, password: &str, email: &str) -> Result<()> {
        let url = join(&self.base_url, "auth/signup");
        let body = post_json_any_status(
            &self.agent,
            &url,
            &Credentials {
                username,
                password,
                email: Some(email),
            },
        )?;
        let reply = parse_reply(body)?;
        if reply.success {
            info!(%username, "account created");
            Ok(())
        } else {
            Err(rejected(reply, "Signup failed"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::canned::CannedServer;
    use serde_json::json;

    #[test]
    fn login_over_http() {
        let server = CannedServer::start(vec![
            (200, r#"{"success":true,"user":{"username":"asha","id":7}}"#),
            (401, r#"{"success":false,"message":"Invalid creds"}"#),
            (500, r#"{"error":"db down"}"#),
        ]);
        let auth = AuthService::new(&server.url);

        let user = auth.login("asha", "pw").unwrap();
        assert_eq!(user.username.as_deref(), Some("asha"));
        assert_eq!(server.next_request().line, "POST /auth/login HTTP/1.1");

        assert!(matches!(
            auth.login("asha", "wrong"),
            Err(ServiceError::Rejected(message)) if message == "Invalid creds"
        ));
        match auth.login("asha", "pw") {
            Err(ServiceError::ServiceUnavailable { status, message }) => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "db down");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn signup_over_http() {
        let server = CannedServer::start(vec![
            (200, r#"{"success":true}"#),
            (409, r#"{"success":false}"#),
            (502, "Bad Gateway"),
        ]);
        let auth = AuthService::new(&server.url);

        auth.signup("asha", "pw", "asha@example.org").unwrap();
        let seen = server.next_request();
        assert_eq!(seen.line, "POST /auth/signup HTTP/1.1");
        assert_eq!(
            serde_json::from_str::<Value>(&seen.body).unwrap(),
            json!({ "username": "asha", "password": "pw", "email": "asha@example.org" })
        );

        assert!(matches!(
            auth.signup("asha", "pw", "asha@example.org"),
            Err(ServiceError::Rejected(message)) if message == "Signup failed"
        ));
        assert!(matches!(
            auth.signup("asha", "pw", "asha@example.org"),
            Err(ServiceError::ServiceUnavailable { status: Some(502), .. })
        ));
    }

    #[test]
    fn credentials_omit_email_on_login() {
        let login = serde_json::to_value(Credentials {
            username: "asha",
            password: "pw",
            email: None,
        })
        .unwrap();
        assert_eq!(login, json!({ "username": "asha", "password": "pw" }));
    }

    #[test]
    fn failure_message_falls_back() {
        let reply = parse_reply(json!({ "success": false })).unwrap();
        assert_eq!(
            rejected(reply, "Signup failed").to_string(),
            "request rejected: Signup failed"
        );

        let reply = parse_reply(json!({ "success": false, "message": "Username taken" })).unwrap();
        assert_eq!(rejected(reply, "Signup failed").user_message(), "Username taken");
    }

    #[test]
    fn user_keeps_unknown_fields() {
        let reply = parse_reply(json!({
            "success": true,
            "user": { "username": "asha", "id": 7, "grade": 5 }
        }))
        .unwrap();
        let user = reply.user.unwrap();
        assert_eq!(user.username.as_deref(), Some("asha"));
        assert_eq!(user.extra.get("grade"), Some(&json!(5)));
    }

    #[test]
    fn reply_without_success_is_malformed() {
        assert!(matches!(
            parse_reply(json!({ "user": {} })),
            Err(ServiceError::MalformedResponse(_))
        ));
    }
}
