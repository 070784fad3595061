//! relay CLI 分发：`issue`、`issue-anonymous`、`identity-token`、`verify`、
//! `relay-check`、`doctor`、`version`。

use anyhow::{Context, anyhow};
use rt_relay::{Authorizer, RelayConfig};
use serde_json::json;

/// 命令执行结果：决定进程退出码。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CliOutcome {
    Success,
    /// 凭证被拒、relay 未授权或 token 无效。
    Rejected,
}

/// 需要 Authorizer 的命令。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Issue { email: String, password: String },
    IssueAnonymous,
    IdentityToken,
    Verify { token: String },
    RelayCheck { relay_id: String },
    Doctor { format: DoctorFormat },
}

/// 解析结果：`Help`/`Version` 不需要加载配置。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Parsed {
    Help,
    Version,
    Run(Command),
}

/// `doctor` 输出格式。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DoctorFormat {
    Text,
    Json,
}

/// 解析命令行参数（不含程序名）。
pub(crate) fn parse(args: &[String]) -> anyhow::Result<Parsed> {
    let Some(cmd) = args.first().map(|arg| arg.trim()) else {
        return Ok(Parsed::Help);
    };
    let rest = &args[1..];

    match cmd {
        "" | "-h" | "--help" | "help" => Ok(Parsed::Help),
        "version" => Ok(Parsed::Version),
        "issue" => match rest {
            [email, password] => Ok(Parsed::Run(Command::Issue {
                email: email.clone(),
                password: password.clone(),
            })),
            _ => Err(anyhow!("usage: rt-relay issue <email> <password>")),
        },
        "issue-anonymous" => Ok(Parsed::Run(Command::IssueAnonymous)),
        "identity-token" => Ok(Parsed::Run(Command::IdentityToken)),
        "verify" => match rest {
            [token] => Ok(Parsed::Run(Command::Verify {
                token: token.clone(),
            })),
            _ => Err(anyhow!("usage: rt-relay verify <token>")),
        },
        "relay-check" => match rest {
            [relay_id] => Ok(Parsed::Run(Command::RelayCheck {
                relay_id: relay_id.clone(),
            })),
            _ => Err(anyhow!("usage: rt-relay relay-check <relayId>")),
        },
        "doctor" => Ok(Parsed::Run(Command::Doctor {
            format: parse_doctor_format(rest)?,
        })),
        other => Err(anyhow!(
            "unknown command: {other}; run `rt-relay --help` for usage"
        )),
    }
}

/// 解析 doctor 的 `--format` 参数。
fn parse_doctor_format(args: &[String]) -> anyhow::Result<DoctorFormat> {
    if args.is_empty() {
        return Ok(DoctorFormat::Text);
    }
    if args.len() == 2 && args[0] == "--format" {
        return match args[1].as_str() {
            "text" => Ok(DoctorFormat::Text),
            "json" => Ok(DoctorFormat::Json),
            other => Err(anyhow!("unsupported doctor format: {other}")),
        };
    }
    Err(anyhow!("usage: rt-relay doctor [--format text|json]"))
}

/// 执行命令。
pub(crate) async fn execute(
    command: Command,
    authorizer: &Authorizer,
    config: &RelayConfig,
) -> anyhow::Result<CliOutcome> {
    match command {
        Command::Issue { email, password } => {
            match authorizer.generate_access_token(&email, &password).await? {
                Some(token) => {
                    println!("{token}");
                    Ok(CliOutcome::Success)
                }
                None => {
                    eprintln!("credentials rejected");
                    Ok(CliOutcome::Rejected)
                }
            }
        }
        Command::IssueAnonymous => {
            println!("{}", authorizer.generate_access_token_no_credentials()?);
            Ok(CliOutcome::Success)
        }
        Command::IdentityToken => {
            println!("{}", authorizer.generate_relay_identity_token()?);
            Ok(CliOutcome::Success)
        }
        Command::Verify { token } => match authorizer.decode_access_token(&token).await {
            Ok(claims) => {
                let rendered =
                    serde_json::to_string_pretty(&claims).context("encode token claims")?;
                println!("{rendered}");
                Ok(CliOutcome::Success)
            }
            Err(err) if err.is_invalid_token() => {
                eprintln!("{err}");
                Ok(CliOutcome::Rejected)
            }
            Err(err) => Err(err.into()),
        },
        Command::RelayCheck { relay_id } => {
            let authorized = authorizer.is_relay_authorized(&relay_id).await;
            println!(
                "{relay_id}: {}",
                if authorized { "authorized" } else { "unknown" }
            );
            Ok(if authorized {
                CliOutcome::Success
            } else {
                CliOutcome::Rejected
            })
        }
        Command::Doctor { format } => {
            run_doctor(format, authorizer, config).await;
            Ok(CliOutcome::Success)
        }
    }
}

/// 打印 relay 身份、签名模式与目录概况。
async fn run_doctor(format: DoctorFormat, authorizer: &Authorizer, config: &RelayConfig) {
    let directory = authorizer.relay_directory().await;
    let fingerprint = authorizer.public_key_fingerprint();
    let self_listed = directory.contains_key(authorizer.relay_id());

    match format {
        DoctorFormat::Text => {
            println!("relay-id: {}", authorizer.relay_id());
            println!("signing-mode: {}", authorizer.signing_mode_name());
            println!("key-fingerprint: {}", fingerprint.as_deref().unwrap_or("-"));
            println!("namespace: {}", config.namespace);
            println!("store-path: {}", config.store_path.display());
            println!("directory-relays: {}", directory.len());
            println!("self-listed: {}", if self_listed { "yes" } else { "no" });
        }
        DoctorFormat::Json => {
            let payload = json!({
                "relayId": authorizer.relay_id(),
                "signingMode": authorizer.signing_mode_name(),
                "keyFingerprint": fingerprint,
                "namespace": config.namespace,
                "storePath": config.store_path.display().to_string(),
                "directoryRelays": directory.keys().collect::<Vec<_>>(),
                "selfListed": self_listed,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}

/// 打印 root help。
pub(crate) fn print_root_help() {
    println!("rt-relay usage:");
    println!("  rt-relay issue <email> <password>");
    println!("  rt-relay issue-anonymous");
    println!("  rt-relay identity-token");
    println!("  rt-relay verify <token>");
    println!("  rt-relay relay-check <relayId>");
    println!("  rt-relay doctor [--format text|json]");
    println!("  rt-relay version");
    println!();
    println!("environment: RELAY_ID, RELAY_PRIVATE_KEY, RELAY_PUBLIC_KEY,");
    println!("             RELAY_STORE_NAMESPACE, RELAY_STORE_PATH, RELAY_LOG_DIR");
}

#[cfg(test)]
mod tests {
    use super::{Command, DoctorFormat, Parsed, parse};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse(&args(&[])).expect("empty"), Parsed::Help);
        assert_eq!(parse(&args(&["version"])).expect("version"), Parsed::Version);
        assert_eq!(
            parse(&args(&["issue", "a@example.com", "pw"])).expect("issue"),
            Parsed::Run(Command::Issue {
                email: "a@example.com".to_string(),
                password: "pw".to_string(),
            })
        );
        assert_eq!(
            parse(&args(&["relay-check", "relay-a"])).expect("check"),
            Parsed::Run(Command::RelayCheck {
                relay_id: "relay-a".to_string(),
            })
        );
        assert_eq!(
            parse(&args(&["doctor", "--format", "json"])).expect("doctor"),
            Parsed::Run(Command::Doctor {
                format: DoctorFormat::Json,
            })
        );
    }

    #[test]
    fn rejects_bad_usage() {
        assert!(parse(&args(&["issue", "a@example.com"])).is_err());
        assert!(parse(&args(&["verify"])).is_err());
        assert!(parse(&args(&["doctor", "--format", "yaml"])).is_err());
        assert!(parse(&args(&["serve"])).is_err());
    }
}
