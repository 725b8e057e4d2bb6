//! 配置校验模块
//!
//! 校验规则：
//! - backlog_warning > 0
//! - log.path 非空
//! - notify.recipients 非空且地址合法
//! - mail.auth.user 非空, mail.port > 0

use contracts::{ContractError, FunnelConfig, MailConfig};

/// 校验 FunnelConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &FunnelConfig) -> Result<(), ContractError> {
    validate_backlog_warning(config)?;
    validate_log(config)?;
    validate_notify(config)?;
    Ok(())
}

/// 校验 mail 命名空间配置
pub fn validate_mail(mail: &MailConfig) -> Result<(), ContractError> {
    if mail.auth.user.trim().is_empty() {
        return Err(ContractError::config_validation(
            "mail.auth.user",
            "sending account cannot be empty",
        ));
    }
    if mail.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "mail.host",
            "mail host cannot be empty",
        ));
    }
    if mail.port == 0 {
        return Err(ContractError::config_validation(
            "mail.port",
            "mail port must be > 0",
        ));
    }
    Ok(())
}

/// 校验积压告警阈值
fn validate_backlog_warning(config: &FunnelConfig) -> Result<(), ContractError> {
    if config.backlog_warning == 0 {
        return Err(ContractError::config_validation(
            "backlog_warning",
            "backlog_warning must be > 0",
        ));
    }
    Ok(())
}

/// 校验文件 sink
fn validate_log(config: &FunnelConfig) -> Result<(), ContractError> {
    if let Some(log) = &config.log {
        if log.path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                "log.path",
                "log path cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验邮件 sink
fn validate_notify(config: &FunnelConfig) -> Result<(), ContractError> {
    let Some(notify) = &config.notify else {
        return Ok(());
    };

    notify.recipients.validate().map_err(|e| match e {
        ContractError::InvalidAddress { address } => ContractError::config_validation(
            "notify.recipients",
            format!("invalid address '{address}'"),
        ),
        other => other,
    })?;

    if let Some(mail) = &notify.mail {
        validate_mail(mail)?;
    }
    Ok(())
}
