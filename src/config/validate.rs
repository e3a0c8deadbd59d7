use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.general.app_base_url.trim().is_empty() {
        errors.push("general.app_base_url must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.admin_email.trim().is_empty() {
            errors.push("auth.admin_email must not be empty".to_string());
        }

        if auth.admin_password.len() < 8 {
            errors.push("auth.admin_password must be at least 8 characters".to_string());
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.session_ttl_hours == 0 {
            errors.push("auth.session_ttl_hours must be > 0".to_string());
        }
    }

    if cfg.mail.smtp_host.trim().is_empty() {
        errors.push("mail.smtp_host must not be empty".to_string());
    }

    if cfg.mail.send_timeout_secs == 0 {
        errors.push("mail.send_timeout_secs must be > 0".to_string());
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig};

    fn auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "secret".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "adminpassword".to_string(),
            session_ttl_hours: 12,
            turnstile_secret: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig {
            auth: Some(auth()),
            ..Default::default()
        };
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let mut cfg = AppConfig {
            database: Some(DatabaseConfig {
                url: " ".to_string(),
                max_connections: 1,
                min_idle: 4,
            }),
            auth: Some(AuthConfig {
                admin_password: "short".to_string(),
                session_ttl_hours: 0,
                ..auth()
            }),
            ..Default::default()
        };
        cfg.mail.send_timeout_secs = 0;

        let message = validate(&cfg).expect_err("config should be rejected").to_string();
        assert!(message.contains("database.url must not be empty"));
        assert!(message.contains("database.min_idle (4)"));
        assert!(message.contains("auth.admin_password must be at least 8 characters"));
        assert!(message.contains("auth.session_ttl_hours must be > 0"));
        assert!(message.contains("mail.send_timeout_secs must be > 0"));
    }
}
